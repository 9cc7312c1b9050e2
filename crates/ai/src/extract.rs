//! Command extraction from raw model output.
//!
//! The model is asked for a JSON array of flat command objects but is not
//! trusted to comply. Extraction accepts, in order:
//!
//! 1. the whole text as a JSON array (or a single object, promoted to a
//!    one-element array);
//! 2. otherwise, the substring from the first `[` to the last `]`, when that
//!    parses as an array.
//!
//! Anything else yields no commands. Entries that are not objects or lack a
//! non-empty string `action` are dropped; source order is kept.

use core::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Default cap on how much model output is looked at.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 64 * 1024;

/// One structurally valid command object, exactly as the model produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawCommand(Map<String, Value>);

impl RawCommand {
    /// Accepts an object only if it carries a non-empty string `action`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) if has_action(&fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn action(&self) -> &str {
        self.0
            .get("action")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl fmt::Display for RawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

fn has_action(fields: &Map<String, Value>) -> bool {
    matches!(fields.get("action"), Some(Value::String(s)) if !s.trim().is_empty())
}

/// Size-bounded command extractor.
#[derive(Debug, Copy, Clone)]
pub struct CommandExtractor {
    max_bytes: usize,
}

impl Default for CommandExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESPONSE_BYTES)
    }
}

impl CommandExtractor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Extract the ordered command sequence from `raw`. Never fails.
    pub fn extract(&self, raw: &str) -> Vec<RawCommand> {
        if raw.len() > self.max_bytes {
            tracing::warn!(
                bytes = raw.len(),
                limit = self.max_bytes,
                "model output exceeds size limit; ignoring it"
            );
            return Vec::new();
        }

        let commands = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => keep_commands(entries),
            Ok(obj @ Value::Object(_)) => keep_commands(vec![obj]),
            Ok(_) => Vec::new(),
            Err(_) => extract_embedded_array(raw),
        };

        tracing::debug!(count = commands.len(), "extracted commands from model output");
        commands
    }
}

/// Extract with the default size bound.
pub fn extract(raw: &str) -> Vec<RawCommand> {
    CommandExtractor::default().extract(raw)
}

fn extract_embedded_array(raw: &str) -> Vec<RawCommand> {
    let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    // Both delimiters are ASCII, so the slice lands on char boundaries.
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(Value::Array(entries)) => keep_commands(entries),
        _ => Vec::new(),
    }
}

fn keep_commands(entries: Vec<Value>) -> Vec<RawCommand> {
    entries.into_iter().filter_map(RawCommand::from_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn actions(cmds: &[RawCommand]) -> Vec<&str> {
        cmds.iter().map(RawCommand::action).collect()
    }

    #[test]
    fn plain_array_is_accepted_in_order() {
        let raw = r#"[
            {"action": "add", "item": "leche", "quantity": 2, "unit": "L"},
            {"action": "set", "item": "huevos", "quantity": 6}
        ]"#;
        let cmds = extract(raw);
        assert_eq!(actions(&cmds), vec!["add", "set"]);
        assert_eq!(cmds[0].fields()["item"], json!("leche"));
    }

    #[test]
    fn single_object_is_promoted() {
        let cmds = extract(r#"{"action": "remove", "item": "arroz"}"#);
        assert_eq!(actions(&cmds), vec!["remove"]);
    }

    #[test]
    fn array_is_recovered_from_surrounding_prose() {
        let raw = "Claro, aquí tienes:\n```json\n\
                   [{\"action\": \"add\", \"item\": \"pan\", \"quantity\": 1}]\n```\n¡Listo!";
        assert_eq!(actions(&extract(raw)), vec!["add"]);
    }

    #[test]
    fn entries_without_action_are_dropped() {
        let raw = r#"[
            {"action": "add"}, 3, "set", {"item": "x"},
            {"action": ""}, {"action": 5}, {"action": "set"}
        ]"#;
        assert_eq!(actions(&extract(raw)), vec!["add", "set"]);
    }

    #[test]
    fn scalars_and_garbage_yield_nothing() {
        assert!(extract("42").is_empty());
        assert!(extract("no entendí nada").is_empty());
        assert!(extract("] antes [").is_empty());
        assert!(extract("[ esto no es json ]").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn embedded_object_without_brackets_is_not_recovered() {
        assert!(extract(r#"Respuesta: {"action": "add", "item": "pan"}"#).is_empty());
    }

    #[test]
    fn oversized_output_is_ignored() {
        let extractor = CommandExtractor::new(16);
        assert!(extractor.extract(r#"[{"action": "add", "item": "leche"}]"#).is_empty());
    }

    #[test]
    fn display_renders_compact_json() {
        let cmd = RawCommand::from_value(json!({"action": "remove"})).unwrap();
        assert_eq!(cmd.to_string(), r#"{"action":"remove"}"#);
    }

    proptest! {
        #[test]
        fn array_extraction_keeps_only_actions_in_order(
            entries in proptest::collection::vec(
                prop_oneof![
                    "[a-z_]{1,12}".prop_map(|a| json!({"action": a, "item": "x"})),
                    Just(json!({"item": "sin accion"})),
                    Just(json!(7)),
                    Just(json!("texto")),
                ],
                0..20,
            )
        ) {
            let expected: Vec<String> = entries
                .iter()
                .filter_map(|v| v.get("action").and_then(Value::as_str).map(str::to_string))
                .collect();
            let raw = Value::Array(entries).to_string();
            let got: Vec<String> = extract(&raw).iter().map(|c| c.action().to_string()).collect();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn text_without_json_containers_yields_nothing(raw in "[^\\[\\]{}]{0,200}") {
            prop_assert!(extract(&raw).is_empty());
        }

        #[test]
        fn extraction_never_panics(raw in ".{0,300}") {
            let _ = extract(&raw);
        }
    }
}
