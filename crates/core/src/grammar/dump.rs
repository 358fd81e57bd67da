use serde::Serialize;
use texfilter_diagnostics::LineIndex;

use super::token::{MarkedToken, TokenKind};

/// One row of a token report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenReport<'a> {
    /// Command or environment name after parsing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    /// Token kind.
    pub kind: TokenKind,
    /// Source text.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Zero-based line of `start`.
    pub line: usize,
    /// Zero-based byte column of `start`.
    pub column: usize,
    /// Parser mark: translatable.
    pub translatable: bool,
    /// Parser mark: externality.
    pub externality: u32,
    /// Parser mark: tag id.
    pub tag_id: i32,
    /// Parser mark: escaping.
    pub escape: bool,
    /// Parser mark: open environments.
    #[serde(skip_serializing_if = "no_environments")]
    pub environments: &'a [String],
}

fn no_environments(envs: &&[String]) -> bool {
    envs.is_empty()
}

/// Build report rows for marked tokens of `source`.
pub fn token_report<'a>(source: &str, tokens: &'a [MarkedToken<'a>]) -> Vec<TokenReport<'a>> {
    let index = LineIndex::new(source);
    tokens
        .iter()
        .map(|t| {
            let (line, column) = index.line_col(t.token.start);
            TokenReport {
                name: t.token.name,
                kind: t.token.kind,
                text: t.token.text,
                start: t.token.start,
                line,
                column,
                translatable: t.mark.translatable,
                externality: t.mark.externality,
                tag_id: t.mark.tag_id,
                escape: t.mark.escape,
                environments: &t.mark.environments,
            }
        })
        .collect()
}

/// Serialize a token report to a pretty-printed JSON string.
pub fn tokens_to_json(source: &str, tokens: &[MarkedToken<'_>]) -> String {
    serde_json::to_string_pretty(&token_report(source, tokens))
        .expect("token report serialization cannot fail")
}
