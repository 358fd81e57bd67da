//! Two-phase LaTeX tokenizer.
//!
//! Phase one finds constructs whose content must not be split by anything
//! else (hyperlink targets, comments, verbatim bodies, `\verb`). They are
//! matched concurrently and the earliest start wins. Phase two runs the
//! remaining patterns one after another in priority order over the whole
//! text; a match is kept only if none of its bytes has been claimed yet.
//! Unclaimed gaps become [`TokenKind::Text`] or [`TokenKind::Whitespace`].
//!
//! "Unescaped" below always means: not immediately preceded by a backslash.

use std::sync::LazyLock;

use regex::Regex;

use super::token::{Token, TokenKind};

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static lexer pattern")
}

// ── Phase one ───────────────────────────────────────────────────────────────

static HYPERLINK_OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"\\(?:href|url)\{"));
static COMMENT: LazyLock<Regex> = LazyLock::new(|| re(r"%[^\n\r\x{85}\x{2028}\x{2029}]*"));
static VERBATIM_OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"\\begin\{verbatim\*?\}"));
static VERBATIM_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r"\\end\{verbatim\*?\}"));
static VERB: LazyLock<Regex> = LazyLock::new(|| re(r"\\verb"));
static GROUP_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r"\}"));

// ── Phase two ───────────────────────────────────────────────────────────────

/// Closing pattern of a delimited construct. The body between opener and
/// closer is non-empty and stays on one line.
struct Closer {
    pattern: Regex,
    escapable: bool,
}

struct Rule {
    kind: TokenKind,
    open: Regex,
    close: Option<Closer>,
    escapable: bool,
}

impl Rule {
    fn simple(kind: TokenKind, open: &str) -> Self {
        Self {
            kind,
            open: re(open),
            close: None,
            escapable: true,
        }
    }

    fn delimited(kind: TokenKind, open: &str, close: &str) -> Self {
        Self {
            kind,
            open: re(open),
            close: Some(Closer {
                pattern: re(close),
                escapable: true,
            }),
            escapable: true,
        }
    }

    fn raw(mut self) -> Self {
        self.escapable = false;
        self
    }

    fn raw_closer(mut self) -> Self {
        if let Some(close) = self.close.as_mut() {
            close.escapable = false;
        }
        self
    }

    /// First match starting at or after `pos`: `(start, end, name range)`.
    fn find_at(&self, text: &str, mut pos: usize) -> Option<(usize, usize, Option<(usize, usize)>)> {
        while pos <= text.len() {
            let caps = self.open.captures_at(text, pos)?;
            let m = caps.get(0)?;
            if self.escapable && is_escaped(text, m.start()) {
                pos = next_char(text, m.start());
                continue;
            }
            let end = match &self.close {
                None => m.end(),
                Some(close) => match body_end(text, m.end(), &close.pattern, close.escapable) {
                    Some((_, end)) => end,
                    None => {
                        pos = next_char(text, m.start());
                        continue;
                    }
                },
            };
            let name = caps.get(1).map(|g| (g.start(), g.end()));
            return Some((m.start(), end, name));
        }
        None
    }
}

static ORDERED_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    use TokenKind::*;
    vec![
        // \~{} before groups so its braces stay text
        Rule::simple(Text, r"\\~\{\}"),
        Rule::delimited(InlineMath, r"\$", r"\$"),
        Rule::delimited(InlineMath, r"\\\(", r"\\\)"),
        Rule::delimited(InlineMath, r"\\begin\{math\}", r"\\end\{math\}"),
        Rule::delimited(DisplayMath, r"\\\[", r"\\\]"),
        Rule::delimited(DisplayMath, r"\\begin\{displaymath\}", r"\\end\{displaymath\}"),
        Rule::delimited(DisplayMath, r"\\begin\{equation\*?\}", r"\\end\{equation\*?\}"),
        Rule::simple(EnvBegin, r"\\begin\*?\{([a-z]{2,})\}"),
        Rule::simple(EnvEnd, r"\\end\*?\{([a-z]{2,})\}"),
        Rule::delimited(Options, r"\[", r"\]").raw_closer(),
        Rule::simple(Command, r"\\([a-z]{2,})\*?"),
        Rule::simple(GroupBegin, r"\{"),
        Rule::simple(GroupEnd, r"\}"),
        Rule::simple(Ampersand, r"&"),
        Rule::simple(LineBreak, r"\\\\").raw(),
        Rule::simple(EmptyLine, r"\n[ \t\n\r\x0B\x0C]*\n").raw(),
    ]
});

// ── Helpers ─────────────────────────────────────────────────────────────────

fn is_escaped(text: &str, pos: usize) -> bool {
    pos > 0 && text.as_bytes()[pos - 1] == b'\\'
}

fn next_char(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

/// Whitespace as understood by the gap classifier and segment trimming.
pub(crate) fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C')
}

/// Lazily match a non-empty single-line body starting at `body_start` up to
/// the first `close` match. Returns `(body_end, closer_end)`.
fn body_end(text: &str, body_start: usize, close: &Regex, escapable: bool) -> Option<(usize, usize)> {
    let first = text.get(body_start..)?.chars().next()?;
    if is_line_break(first) {
        return None;
    }
    let mut pos = body_start + first.len_utf8();
    loop {
        let m = close.find_at(text, pos)?;
        if text[body_start..m.start()].contains(is_line_break) {
            return None;
        }
        if escapable && is_escaped(text, m.start()) {
            pos = next_char(text, m.start());
            continue;
        }
        return Some((m.start(), m.end()));
    }
}

/// Next unescaped match of `pattern` at or after `pos`.
fn find_unescaped<'t>(pattern: &Regex, text: &'t str, mut pos: usize) -> Option<regex::Match<'t>> {
    while pos <= text.len() {
        let m = pattern.find_at(text, pos)?;
        if !is_escaped(text, m.start()) {
            return Some(m);
        }
        pos = next_char(text, m.start());
    }
    None
}

// ── Phase one candidates ────────────────────────────────────────────────────

/// A phase-one match. `claim` is the byte range reserved; `tokens` are emitted.
struct Candidate<'a> {
    claim: (usize, usize),
    tokens: Vec<Token<'a>>,
}

fn hyperlink_targets<'a>(text: &'a str, out: &mut Vec<Candidate<'a>>) {
    let mut pos = 0;
    while let Some(m) = find_unescaped(&HYPERLINK_OPEN, text, pos) {
        match body_end(text, m.end(), &GROUP_CLOSE, false) {
            Some((end, _)) => {
                out.push(Candidate {
                    claim: (m.end(), end),
                    tokens: vec![Token::new(TokenKind::Text, text, m.end(), end)],
                });
                pos = end;
            }
            None => pos = next_char(text, m.start()),
        }
    }
}

fn comments<'a>(text: &'a str, out: &mut Vec<Candidate<'a>>) {
    let mut pos = 0;
    while let Some(m) = find_unescaped(&COMMENT, text, pos) {
        out.push(Candidate {
            claim: (m.start(), m.end()),
            tokens: vec![Token::new(TokenKind::Comment, text, m.start(), m.end())],
        });
        pos = m.end();
    }
}

fn verbatim_bodies<'a>(text: &'a str, out: &mut Vec<Candidate<'a>>) {
    let mut pos = 0;
    while let Some(m) = find_unescaped(&VERBATIM_OPEN, text, pos) {
        match body_end(text, m.end(), &VERBATIM_CLOSE, false) {
            Some((end, _)) => {
                out.push(Candidate {
                    claim: (m.end(), end),
                    tokens: vec![Token::new(TokenKind::Verbatim, text, m.end(), end)],
                });
                pos = end;
            }
            None => pos = next_char(text, m.start()),
        }
    }
}

/// `\verb<d>body<d>` split into command, delimiters and body.
fn verb_literals<'a>(text: &'a str, out: &mut Vec<Candidate<'a>>) {
    let mut pos = 0;
    while let Some(m) = find_unescaped(&VERB, text, pos) {
        match verb_at(text, m.start(), m.end()) {
            Some(candidate) => {
                pos = candidate.claim.1;
                out.push(candidate);
            }
            None => pos = next_char(text, m.start()),
        }
    }
}

fn verb_at(text: &str, start: usize, command_end: usize) -> Option<Candidate<'_>> {
    let delim = text[command_end..].chars().next()?;
    if delim.is_ascii_lowercase() {
        return None;
    }
    let body_start = command_end + delim.len_utf8();
    let mut chars = text[body_start..].char_indices();
    let (_, first) = chars.next()?;
    if is_line_break(first) {
        return None;
    }
    let body_end = chars
        .take_while(|&(_, c)| c == delim || !is_line_break(c))
        .find(|&(_, c)| c == delim)
        .map(|(off, _)| body_start + off)?;
    let end = body_end + delim.len_utf8();
    Some(Candidate {
        claim: (start, end),
        tokens: vec![
            Token::new(TokenKind::Command, text, start, command_end).named("verb"),
            Token::new(TokenKind::GroupBegin, text, command_end, body_start),
            Token::new(TokenKind::Text, text, body_start, body_end),
            Token::new(TokenKind::GroupEnd, text, body_end, end),
        ],
    })
}

// ── Public API ──────────────────────────────────────────────────────────────

/// Tokenize a document.
///
/// The result covers `text` completely, in order, without overlaps, and ends
/// with a zero-width [`TokenKind::Sentinel`] at `text.len()`. Tokenizing never
/// fails: anything unrecognized becomes text.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut claimed = vec![false; text.len()];
    let mut tokens = Vec::new();

    // Phase one: declaration order breaks same-start ties (stable sort).
    let mut candidates = Vec::new();
    hyperlink_targets(text, &mut candidates);
    comments(text, &mut candidates);
    verbatim_bodies(text, &mut candidates);
    verb_literals(text, &mut candidates);
    candidates.sort_by_key(|c| c.claim.0);

    let mut last_end = 0;
    for candidate in candidates {
        let (start, end) = candidate.claim;
        if start < last_end {
            continue;
        }
        claimed[start..end].fill(true);
        tokens.extend(candidate.tokens);
        last_end = end;
    }

    // Phase two.
    for rule in ORDERED_RULES.iter() {
        let mut pos = 0;
        while let Some((start, end, name)) = rule.find_at(text, pos) {
            pos = if end > start { end } else { next_char(text, start) };
            if claimed[start..end].iter().any(|&c| c) {
                continue;
            }
            claimed[start..end].fill(true);
            let mut token = Token::new(rule.kind, text, start, end);
            if let Some((s, e)) = name {
                token = token.named(&text[s..e]);
            }
            tokens.push(token);
        }
    }

    tokens.sort_by_key(|t| t.start);

    // Gaps.
    let mut out = Vec::with_capacity(tokens.len() * 2 + 1);
    let mut cursor = 0;
    for token in tokens {
        if cursor < token.start {
            out.push(gap(text, cursor, token.start));
        }
        cursor = token.end;
        out.push(token);
    }
    if cursor < text.len() {
        out.push(gap(text, cursor, text.len()));
    }
    out.push(Token::sentinel(text.len()));
    out
}

fn gap(text: &str, start: usize, end: usize) -> Token<'_> {
    let kind = if text[start..end].chars().all(is_blank) {
        TokenKind::Whitespace
    } else {
        TokenKind::Text
    };
    Token::new(kind, text, start, end)
}
