// src/env/naming.rs

//! Environment variable naming. These names are the configuration wire
//! format of the meltano CLI and must match it exactly.

/// Prefix for project-level settings.
pub const MELTANO_PREFIX: &str = "MELTANO";

/// Stripped from the inherited environment before a run.
pub const PROJECT_ROOT_VAR: &str = "MELTANO_PROJECT_ROOT";

pub const LOG_FORMAT_VAR: &str = "MELTANO_CLI_LOG_FORMAT";
pub const DEFAULT_LOG_FORMAT: &str = "json";

pub const GIT_SSH_COMMAND_VAR: &str = "GIT_SSH_COMMAND";

const SELECT_FILTER_SUFFIX: &str = "__SELECT_FILTER";

/// `tap-github` → `TAP_GITHUB`.
pub fn plugin_prefix(plugin_name: &str) -> String {
    plugin_name.replace('-', "_").to_uppercase()
}

/// `(tap-github, api_key)` → `TAP_GITHUB_API_KEY`.
pub fn plugin_env_key(plugin_name: &str, setting: &str) -> String {
    format!("{}_{}", plugin_prefix(plugin_name), setting.to_uppercase())
}

/// `MELTANO_` followed by each path segment uppercased, joined by `_`.
///
/// `["state_backend", "s3", "region"]` → `MELTANO_STATE_BACKEND_S3_REGION`.
pub fn meltano_env_key<S: AsRef<str>>(path: &[S]) -> String {
    let mut key = MELTANO_PREFIX.to_string();
    for segment in path {
        key.push('_');
        key.push_str(&segment.as_ref().to_uppercase());
    }
    key
}

/// `tap-github` → `TAP_GITHUB__SELECT_FILTER`.
pub fn select_filter_key(extractor_name: &str) -> String {
    format!("{}{}", plugin_prefix(extractor_name), SELECT_FILTER_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_keys() {
        assert_eq!(plugin_env_key("tap-test", "api_key"), "TAP_TEST_API_KEY");
        assert_eq!(plugin_env_key("tap-test", "_catalog"), "TAP_TEST__CATALOG");
        assert_eq!(plugin_env_key("target-pg-2", "Port"), "TARGET_PG_2_PORT");
    }

    #[test]
    fn meltano_keys_nest() {
        assert_eq!(meltano_env_key(&["cli", "log_level"]), "MELTANO_CLI_LOG_LEVEL");
        assert_eq!(
            meltano_env_key(&["state_backend", "mybackend", "api_url"]),
            "MELTANO_STATE_BACKEND_MYBACKEND_API_URL"
        );
    }

    #[test]
    fn select_filter_uses_double_underscore() {
        assert_eq!(select_filter_key("tap-github"), "TAP_GITHUB__SELECT_FILTER");
    }
}
