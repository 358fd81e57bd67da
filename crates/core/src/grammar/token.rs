use std::sync::Arc;

use serde::Serialize;

/// Classification of a lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// `%` to end of line.
    Comment,
    /// `\begin{name}`.
    EnvBegin,
    /// `\end{name}`.
    EnvEnd,
    /// `\name` (lowercase letters, optional `*`).
    Command,
    /// `{`, or the opening `\verb` delimiter.
    GroupBegin,
    /// `}`, or the closing `\verb` delimiter.
    GroupEnd,
    /// `[...]` on one line.
    Options,
    /// `&` table cell separator.
    Ampersand,
    /// `$...$`, `\(...\)` or a `math` environment on one line.
    InlineMath,
    /// `\[...\]`, `displaymath` or `equation` on one line.
    DisplayMath,
    /// Body of a single-line `verbatim` environment.
    Verbatim,
    /// `\\`.
    LineBreak,
    /// Two line feeds separated only by whitespace.
    EmptyLine,
    /// Anything else that is not pure whitespace.
    Text,
    /// A gap consisting only of whitespace.
    Whitespace,
    /// Zero-width end marker.
    Sentinel,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenKind::Comment => "comment",
            TokenKind::EnvBegin => "env_begin",
            TokenKind::EnvEnd => "env_end",
            TokenKind::Command => "command",
            TokenKind::GroupBegin => "group_begin",
            TokenKind::GroupEnd => "group_end",
            TokenKind::Options => "options",
            TokenKind::Ampersand => "ampersand",
            TokenKind::InlineMath => "inline_math",
            TokenKind::DisplayMath => "display_math",
            TokenKind::Verbatim => "verbatim",
            TokenKind::LineBreak => "line_break",
            TokenKind::EmptyLine => "empty_line",
            TokenKind::Text => "text",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Sentinel => "sentinel",
        };
        f.write_str(s)
    }
}

/// A token that borrows its text from the source document.
///
/// `text` is always exactly `&source[start..end]`. `name` holds the command
/// or environment name for named tokens; the parser may replace it with one of
/// the reserved command names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokenKind,
    /// Borrowed slice of the source for this token.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// Command or environment name.
    pub name: Option<&'a str>,
}

impl<'a> Token<'a> {
    /// Token covering `source[start..end]`.
    pub fn new(kind: TokenKind, source: &'a str, start: usize, end: usize) -> Self {
        Self {
            kind,
            text: &source[start..end],
            start,
            end,
            name: None,
        }
    }

    /// Attach a name (builder style).
    pub fn named(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Zero-width sentinel at `pos`.
    pub fn sentinel(pos: usize) -> Self {
        Self {
            kind: TokenKind::Sentinel,
            text: "",
            start: pos,
            end: pos,
            name: None,
        }
    }
}

/// Ordered names of the open environments, shared between marks.
pub type Environments = Arc<[String]>;

/// Parser verdict attached to every token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserMark {
    /// The token goes to the translator.
    pub translatable: bool,
    /// Nesting depth of external arguments around the token.
    pub externality: u32,
    /// `0` no tag, `> 0` opens (or closes itself), `< 0` closes `|tag_id|`.
    pub tag_id: i32,
    /// LaTeX escapes are undone before translation.
    pub escape: bool,
    /// Environments open when the token was marked.
    pub environments: Environments,
}

/// A token together with its parser mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedToken<'a> {
    /// The (possibly renamed) token.
    pub token: Token<'a>,
    /// The parser's verdict.
    pub mark: ParserMark,
}

impl<'a> MarkedToken<'a> {
    /// Non-translatable sentinel at `pos` with the given externality.
    pub fn sentinel(pos: usize, externality: u32) -> Self {
        Self {
            token: Token::sentinel(pos),
            mark: ParserMark {
                translatable: false,
                externality,
                tag_id: 0,
                escape: true,
                environments: Arc::from([]),
            },
        }
    }
}
