//! texfilter core library.
//!
//! Splits LaTeX documents into translatable segments, replaces inline markup
//! with numbered tags (`<b1>…</b1>`, `<f1/>`) and puts the markup back after
//! translation. The main entry points are [`FilterSession::process_document`],
//! [`translate_str`] and [`extract_segments`].

#![warn(missing_docs)]

/// Fatal filter errors.
pub mod error;
/// Segment assembly, tags, escaping and providers.
pub mod filter;
/// LaTeX grammar: lexer, parser and token marks.
pub mod grammar;

// ── Convenience re-exports ──────────────────────────────────────────────────

// Errors
pub use error::FilterError;

// Filter
pub use filter::providers::{
    DictionaryProvider, IdentityProvider, Segment, SegmentCollector, TranslationProvider,
};
pub use filter::session::{FilterOptions, FilterSession, extract_segments, translate_str};
pub use filter::tags::TagAllocator;

// Grammar
pub use grammar::dump::{TokenReport, token_report, tokens_to_json};
pub use grammar::lexer::tokenize;
pub use grammar::parser::Parser;
pub use grammar::token::{MarkedToken, ParserMark, Token, TokenKind};

// Diagnostics and tables (re-exported from their crates)
pub use texfilter_diagnostics::{Diagnostic, Severity, Span, codes};
pub use texfilter_tables::{CommandDescriptor, CommandKind, CommandTable, TableError};
