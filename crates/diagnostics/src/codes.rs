//! Diagnostic ID constants.
//!
//! Use these instead of string literals to get compile-time typo detection
//! and IDE autocomplete. Every code has an entry in [`crate::explain`].

// ── Parser ──────────────────────────────────────────────────────────────

/// `\end{…}` does not match the innermost open environment.
pub const PARSER_ENVIRONMENT_MISMATCH: &str = "TEX1001";
/// A command used in the document is not declared in the command table.
pub const PARSER_UNKNOWN_COMMAND: &str = "TEX1002";

// ── Segment assembly ────────────────────────────────────────────────────

/// A tag cache could not be turned into an inline tag.
pub const FILTER_TAG_ALLOCATION: &str = "TEX2001";
/// A closing tag id has no previously registered opening tag.
pub const FILTER_UNPAIRED_TAG: &str = "TEX2002";
/// The output sink refused a write.
pub const FILTER_SINK: &str = "TEX2003";

// ── Command table configuration ─────────────────────────────────────────

/// A command name is declared more than once.
pub const CONFIG_DUPLICATE_COMMAND: &str = "TEX3001";
/// A FORMAT command has no `tag` property.
pub const CONFIG_MISSING_TAG: &str = "TEX3002";
/// A tag label does not match `^[A-Za-z]+[0-9]*$`.
pub const CONFIG_INVALID_TAG: &str = "TEX3003";
/// An alphabetic (auto-numbered) label is used by a command without an external argument.
pub const CONFIG_UNNUMBERED_TAG: &str = "TEX3004";
/// A tag label is declared more than once.
pub const CONFIG_DUPLICATE_TAG: &str = "TEX3005";
/// A numbered label collides with an auto-numbered alphabetic label.
pub const CONFIG_TAG_CONFLICT: &str = "TEX3006";
/// A configured command shadows one of the reserved internal commands.
pub const CONFIG_RESERVED_NAME: &str = "TEX3007";
