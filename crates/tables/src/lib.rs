//! LaTeX command tables for texfilter.
//!
//! Defines command descriptors, argument specs and the environment
//! classification the parser consults. Tables are built from the JSON
//! configuration format in [`source`]; the default table is embedded in the
//! crate and parsed once per process.

pub mod lint;
pub mod source;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub use lint::{lint_config, lint_config_str, scan_unknown_commands};
pub use source::ConfigSource;

/// Default configuration, embedded at compile time.
pub const BUILTIN_CONFIG_JSON: &str = include_str!("../data/commands.json");

// ── Reserved commands ───────────────────────────────────────────────────────

/// Virtual command wrapping a bare `{...}` group.
pub const GROUP_COMMAND: &str = "virtual-group-command";
/// Fallback for commands missing from the table.
pub const UNKNOWN_COMMAND: &str = "unknown-command";
/// Stand-in for non-translatable tokens inside external content.
pub const MASK_COMMAND: &str = "mask-command";
/// Stand-in for inline math spans.
pub const INLINE_MATH_COMMAND: &str = "inline-math";

/// Names that always resolve to the reserved descriptors.
pub const RESERVED_COMMANDS: [&str; 4] =
    [GROUP_COMMAND, UNKNOWN_COMMAND, MASK_COMMAND, INLINE_MATH_COMMAND];

const GROUP_COMMAND_TAG: &str = "G0";
const UNKNOWN_COMMAND_TAG: &str = "U";
const MASK_COMMAND_TAG: &str = "M";
const INLINE_MATH_COMMAND_TAG: &str = "Math";

/// How a command relates to translatable text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandKind {
    /// Produces no text; consumes its options and arguments.
    Control,
    /// Carries text as arguments but is not itself part of a sentence.
    Content,
    /// Inline formatting; becomes a tag inside the segment.
    Format,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Control => write!(f, "CONTROL"),
            CommandKind::Content => write!(f, "CONTENT"),
            CommandKind::Format => write!(f, "FORMAT"),
        }
    }
}

/// Behavior of one `{...}` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    /// The argument text is sent to the translator.
    pub translatable: bool,
    /// The argument is translated as a separate segment.
    pub external: bool,
    /// LaTeX escapes are undone before translation.
    pub escape: bool,
}

impl ArgumentSpec {
    /// Ordinary inline argument: translatable, not external, escaped.
    pub const PLAIN: ArgumentSpec = ArgumentSpec {
        translatable: true,
        external: false,
        escape: true,
    };

    /// Create an argument spec.
    pub const fn new(translatable: bool, external: bool, escape: bool) -> Self {
        Self {
            translatable,
            external,
            escape,
        }
    }
}

/// Metadata for one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandDescriptor {
    /// Command kind.
    pub kind: CommandKind,
    /// Name without the leading backslash.
    pub name: String,
    /// Inline tag label (FORMAT commands).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Declared `{...}` arguments in order.
    pub args: Vec<ArgumentSpec>,
    numbered_tags: bool,
    has_plain_argument: bool,
}

impl CommandDescriptor {
    /// Build a descriptor, deriving the numbering and plain-argument flags.
    pub fn new(
        kind: CommandKind,
        name: impl Into<String>,
        tag: Option<String>,
        args: Vec<ArgumentSpec>,
    ) -> Self {
        let name = name.into();
        let has_plain_argument = args.iter().any(|a| a.translatable && !a.external);
        let numbered_tags = (kind == CommandKind::Format && args.iter().any(|a| a.external))
            || matches!(
                name.as_str(),
                UNKNOWN_COMMAND | MASK_COMMAND | INLINE_MATH_COMMAND
            )
            || tag
                .as_deref()
                .is_some_and(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphabetic()));
        Self {
            kind,
            name,
            tag,
            args,
            numbered_tags,
            has_plain_argument,
        }
    }

    /// Any argument is translatable and not external, so the command needs
    /// an opening/closing tag pair instead of a closed tag.
    pub fn has_plain_argument(&self) -> bool {
        self.has_plain_argument
    }

    /// Tags of this command get a per-label counter suffix.
    pub fn numbered_tags(&self) -> bool {
        self.numbered_tags
    }

    /// `true` for FORMAT commands.
    pub fn is_format(&self) -> bool {
        self.kind == CommandKind::Format
    }

    /// Tag label; commands declared without one fall back to their name.
    pub fn label(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }
}

/// Errors raised while loading a command table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The configuration file could not be read.
    #[error("failed to read command table {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid JSON or does not match the schema.
    #[error("invalid command table: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable command and environment lookup table.
#[derive(Debug, Clone)]
pub struct CommandTable {
    commands: HashMap<String, CommandDescriptor>,
    unknown: CommandDescriptor,
    option_consumers: HashSet<String>,
    argument_consumers: HashSet<String>,
    table_environments: HashSet<String>,
}

impl CommandTable {
    /// The embedded default table, parsed on first use.
    pub fn builtin() -> &'static CommandTable {
        static BUILTIN: OnceLock<CommandTable> = OnceLock::new();
        BUILTIN.get_or_init(|| match CommandTable::from_json_str(BUILTIN_CONFIG_JSON) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("embedded command table is invalid: {e}");
                CommandTable::from_source(&ConfigSource::default())
            }
        })
    }

    /// Parse a table from configuration JSON.
    pub fn from_json_str(json: &str) -> Result<Self, TableError> {
        let source: ConfigSource = serde_json::from_str(json)?;
        Ok(Self::from_source(&source))
    }

    /// Read and parse a table from a configuration file.
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let json = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), commands = table.len(), "loaded command table");
        Ok(table)
    }

    /// Build a table from a parsed configuration.
    ///
    /// Later entries replace earlier ones with the same name; the reserved
    /// commands are added last and replace any user entry.
    pub fn from_source(source: &ConfigSource) -> Self {
        use source::CommandEntrySource;

        let mut commands = HashMap::new();
        for group in &source.all_commands {
            for entry in &group.commands {
                let args = match entry {
                    CommandEntrySource::Name(_) => {
                        if group.kind == CommandKind::Content {
                            vec![ArgumentSpec::PLAIN]
                        } else {
                            Vec::new()
                        }
                    }
                    CommandEntrySource::Detailed(d) => match &d.args {
                        None if group.kind != CommandKind::Control => vec![ArgumentSpec::PLAIN],
                        None | Some(None) => Vec::new(),
                        Some(Some(list)) => list
                            .iter()
                            .map(|a| ArgumentSpec::new(a.translate, a.external, a.escape))
                            .collect(),
                    },
                };
                let descriptor = CommandDescriptor::new(
                    group.kind,
                    entry.name(),
                    entry.tag().map(str::to_string),
                    args,
                );
                if commands
                    .insert(descriptor.name.clone(), descriptor)
                    .is_some()
                {
                    tracing::warn!(command = entry.name(), "duplicate command entry; last one wins");
                }
            }
        }

        let unknown = reserved(UNKNOWN_COMMAND, UNKNOWN_COMMAND_TAG, vec![ArgumentSpec::PLAIN]);
        for descriptor in [
            reserved(GROUP_COMMAND, GROUP_COMMAND_TAG, vec![ArgumentSpec::PLAIN]),
            unknown.clone(),
            reserved(MASK_COMMAND, MASK_COMMAND_TAG, Vec::new()),
            reserved(INLINE_MATH_COMMAND, INLINE_MATH_COMMAND_TAG, Vec::new()),
        ] {
            commands.insert(descriptor.name.clone(), descriptor);
        }

        let env = &source.environments;
        Self {
            commands,
            unknown,
            option_consumers: env.consume_options.iter().cloned().collect(),
            argument_consumers: env.consume_arguments.iter().cloned().collect(),
            table_environments: env.table.iter().cloned().collect(),
        }
    }

    /// Descriptor for `name`, or the unknown-command descriptor.
    pub fn get(&self, name: &str) -> &CommandDescriptor {
        self.commands.get(name).unwrap_or(&self.unknown)
    }

    /// Descriptor for `name`, if the table declares it.
    pub fn lookup(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    /// Whether `name` is declared (reserved names included).
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Number of declared commands, reserved ones included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// A table always holds the reserved commands, so this is `false`.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate over all descriptors in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands.values()
    }

    /// The environment's first options block is consumed.
    pub fn is_option_consumer(&self, env: &str) -> bool {
        self.option_consumers.contains(env)
    }

    /// The environment's leading arguments are consumed.
    pub fn is_argument_consumer(&self, env: &str) -> bool {
        self.argument_consumers.contains(env)
    }

    /// The environment is a table (`&` separates cells).
    pub fn is_table_environment(&self, env: &str) -> bool {
        self.table_environments.contains(env)
    }
}

fn reserved(name: &str, tag: &str, args: Vec<ArgumentSpec>) -> CommandDescriptor {
    CommandDescriptor::new(CommandKind::Format, name, Some(tag.to_string()), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: &str) -> CommandTable {
        CommandTable::from_json_str(json).unwrap()
    }

    #[test]
    fn builtin_parses_and_has_reserved_commands() {
        let t = CommandTable::builtin();
        for name in RESERVED_COMMANDS {
            assert!(t.contains(name), "missing reserved command {name}");
        }
        assert_eq!(t.get("textbf").tag.as_deref(), Some("b1"));
        assert!(t.is_table_environment("tabular"));
        assert!(t.is_option_consumer("figure"));
        assert!(t.is_argument_consumer("tabular"));
    }

    #[test]
    fn unknown_name_falls_back() {
        let t = table("{}");
        assert_eq!(t.get("nope").name, UNKNOWN_COMMAND);
        assert!(t.lookup("nope").is_none());
    }

    #[test]
    fn default_arguments_follow_kind_and_shape() {
        let t = table(
            r#"{"allCommands": [
                {"type": "CONTENT", "commands": ["section"]},
                {"type": "CONTROL", "commands": ["label", {"name": "vspace"}]},
                {"type": "FORMAT", "commands": [
                    {"name": "emph", "tag": "e1"},
                    {"name": "hfill", "tag": "hf1", "args": null}
                ]}
            ]}"#,
        );
        assert_eq!(t.get("section").args, vec![ArgumentSpec::PLAIN]);
        assert!(t.get("label").args.is_empty());
        assert!(t.get("vspace").args.is_empty());
        assert_eq!(t.get("emph").args, vec![ArgumentSpec::PLAIN]);
        assert!(t.get("hfill").args.is_empty());
    }

    #[test]
    fn derived_flags() {
        let footnote = CommandDescriptor::new(
            CommandKind::Format,
            "footnote",
            Some("f".into()),
            vec![ArgumentSpec::new(true, true, true)],
        );
        assert!(footnote.numbered_tags());
        assert!(!footnote.has_plain_argument());

        let emph = CommandDescriptor::new(
            CommandKind::Format,
            "emph",
            Some("e1".into()),
            vec![ArgumentSpec::PLAIN],
        );
        assert!(!emph.numbered_tags());
        assert!(emph.has_plain_argument());

        let t = table("{}");
        assert!(t.get(UNKNOWN_COMMAND).numbered_tags());
        assert!(t.get(MASK_COMMAND).numbered_tags());
        assert!(t.get(INLINE_MATH_COMMAND).numbered_tags());
        assert!(!t.get(GROUP_COMMAND).numbered_tags());
    }

    #[test]
    fn reserved_entries_override_user_entries() {
        let t = table(
            r#"{"allCommands": [{"type": "CONTROL", "commands": ["inline-math"]}]}"#,
        );
        let d = t.get(INLINE_MATH_COMMAND);
        assert_eq!(d.kind, CommandKind::Format);
        assert_eq!(d.label(), "Math");
    }

    #[test]
    fn last_duplicate_wins() {
        let t = table(
            r#"{"allCommands": [
                {"type": "FORMAT", "commands": [{"name": "emph", "tag": "e1"}]},
                {"type": "FORMAT", "commands": [{"name": "emph", "tag": "em1"}]}
            ]}"#,
        );
        assert_eq!(t.get("emph").label(), "em1");
    }

    #[test]
    fn label_falls_back_to_name() {
        let d = CommandDescriptor::new(CommandKind::Format, "textsc", None, Vec::new());
        assert_eq!(d.label(), "textsc");
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = CommandTable::from_path(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
        assert!(err.to_string().contains("not/here.json"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = CommandTable::from_json_str("{\"allCommands\": 3}").unwrap_err();
        assert!(matches!(err, TableError::Json(_)));
    }
}
