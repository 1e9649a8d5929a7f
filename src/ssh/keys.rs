// src/ssh/keys.rs

use crate::model::{KeySource, Pipeline};

pub const DEPRECATED_KEYS_WARNING: &str = "Pipeline-level git_ssh_private_keys is deprecated. \
     Configure git_ssh_private_key on individual extractor and loader plugins instead.";

/// SSH keys gathered for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectedKeys {
    pub keys: Vec<KeySource>,
    /// Whether the deprecated pipeline-level list contributed keys. The
    /// caller is responsible for warning about it.
    pub used_deprecated: bool,
}

/// Extractor key, then loader key, then the deprecated pipeline-level keys.
///
/// Empty literal plugin keys count as unset.
pub fn collect_ssh_keys(pipeline: &Pipeline) -> CollectedKeys {
    let mut keys: Vec<KeySource> = [&pipeline.extractor, &pipeline.loader]
        .into_iter()
        .filter_map(|plugin| plugin.git_ssh_private_key.clone())
        .filter(|key| !matches!(key, KeySource::Literal(s) if s.is_empty()))
        .collect();

    let used_deprecated = !pipeline.git_ssh_private_keys.is_empty();
    keys.extend(pipeline.git_ssh_private_keys.iter().cloned());

    CollectedKeys {
        keys,
        used_deprecated,
    }
}
