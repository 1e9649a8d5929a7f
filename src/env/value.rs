// src/env/value.rs

//! Rendering configured values as environment variable text.

use std::io;

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::Formatter;

use crate::errors::{MeltrunError, Result};
use crate::types::SettingKind;

/// Compact JSON with `", "` and `": "` separators, the layout meltano's own
/// tooling produces for structured settings.
#[derive(Debug, Clone, Copy, Default)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Encode `value` as JSON text, keeping mapping insertion order.
pub fn to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    value.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Kind implied by the shape of a value, for settings nobody declared.
pub fn infer_kind(value: &Value) -> SettingKind {
    match value {
        Value::Array(_) => SettingKind::Array,
        Value::Object(_) => SettingKind::Object,
        Value::Bool(_) => SettingKind::Boolean,
        Value::Number(n) if n.is_f64() => SettingKind::Float,
        Value::Number(_) => SettingKind::Integer,
        Value::String(_) | Value::Null => SettingKind::String,
    }
}

/// Render a literal value. `None` means the setting is absent and must not
/// be emitted at all.
pub fn render_literal(kind: SettingKind, value: &Value) -> Result<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        _ if kind.is_structured() => to_json_text(value)?,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => to_json_text(value)?,
    };
    Ok(Some(text))
}

/// Render text read from environment variable `var`. Structured kinds are
/// parsed and re-encoded so the child sees one consistent JSON layout.
pub fn render_env_text(kind: SettingKind, var: &str, raw: String) -> Result<String> {
    if !kind.is_structured() {
        return Ok(raw);
    }
    let parsed: Value = serde_json::from_str(&raw).map_err(|e| {
        MeltrunError::config(format!(
            "environment variable '{var}' must hold JSON for a {kind:?} setting: {e}"
        ))
    })?;
    to_json_text(&parsed)
}
