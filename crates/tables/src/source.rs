//! Serde schema of the command configuration file.
//!
//! The file mirrors what a user edits by hand, so it keeps the loose shapes
//! people actually write: a command may be a bare name or an object, and an
//! object distinguishes a missing `args` key from `"args": null`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::CommandKind;

/// Root of a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSource {
    /// Environment classification lists.
    #[serde(default)]
    pub environments: EnvironmentsSource,
    /// Command groups, one per command kind (kinds may repeat).
    #[serde(default)]
    pub all_commands: Vec<CommandGroupSource>,
}

/// Environment names grouped by behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentsSource {
    /// Environments whose first `[...]` options block is not translatable.
    #[serde(default)]
    pub consume_options: Vec<String>,
    /// Environments whose leading `{...}` arguments are not translatable.
    #[serde(default)]
    pub consume_arguments: Vec<String>,
    /// Environments where `&` and `[...]` are cell syntax.
    #[serde(default)]
    pub table: Vec<String>,
}

/// A list of commands sharing one kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandGroupSource {
    /// Kind applied to every command in the group.
    #[serde(rename = "type")]
    pub kind: CommandKind,
    /// Command entries.
    pub commands: Vec<CommandEntrySource>,
}

/// One command entry: either a bare name or a detailed object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandEntrySource {
    /// `"name"`
    Name(String),
    /// `{"name": ..., "tag": ..., "args": ...}`
    Detailed(DetailedCommandSource),
}

impl CommandEntrySource {
    /// Command name regardless of entry shape.
    pub fn name(&self) -> &str {
        match self {
            CommandEntrySource::Name(name) => name,
            CommandEntrySource::Detailed(d) => &d.name,
        }
    }

    /// Tag label, if the entry declares one.
    pub fn tag(&self) -> Option<&str> {
        match self {
            CommandEntrySource::Name(_) => None,
            CommandEntrySource::Detailed(d) => d.tag.as_deref(),
        }
    }
}

/// Object form of a command entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedCommandSource {
    /// Command name without the leading backslash.
    pub name: String,
    /// Inline tag label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// `None`: key absent. `Some(None)`: explicit `null`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub args: Option<Option<Vec<ArgumentSource>>>,
}

/// One argument declaration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ArgumentSource {
    /// Whether the argument text goes to the translator.
    pub translate: bool,
    /// Whether the argument is translated as its own segment.
    #[serde(default)]
    pub external: bool,
    /// Whether LaTeX escapes are undone before translation.
    #[serde(default = "default_escape")]
    pub escape: bool,
}

fn default_escape() -> bool {
    true
}

// A present key always lands in `Some`, so `null` becomes `Some(None)`
// while `#[serde(default)]` keeps an absent key as `None`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detailed(json: &str) -> DetailedCommandSource {
        match serde_json::from_str::<CommandEntrySource>(json).unwrap() {
            CommandEntrySource::Detailed(d) => d,
            CommandEntrySource::Name(n) => panic!("expected object entry, got name {n}"),
        }
    }

    #[test]
    fn args_absent_null_and_list_are_distinct() {
        assert!(detailed(r#"{"name":"a"}"#).args.is_none());
        assert!(matches!(detailed(r#"{"name":"a","args":null}"#).args, Some(None)));
        let list = detailed(r#"{"name":"a","args":[{"translate":false}]}"#).args;
        let args = list.flatten().unwrap();
        assert_eq!(args.len(), 1);
        assert!(!args[0].translate && !args[0].external && args[0].escape);
    }

    #[test]
    fn bare_name_entry() {
        let e: CommandEntrySource = serde_json::from_str(r#""label""#).unwrap();
        assert_eq!(e.name(), "label");
        assert_eq!(e.tag(), None);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let src: ConfigSource = serde_json::from_str("{}").unwrap();
        assert!(src.all_commands.is_empty());
        assert!(src.environments.table.is_empty());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = serde_json::from_str::<CommandGroupSource>(r#"{"type":"MACRO","commands":[]}"#);
        assert!(err.is_err());
    }
}
