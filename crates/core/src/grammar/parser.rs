//! Token annotation state machine.
//!
//! The parser walks the token stream once, keeping a stack of
//! [`ParserLevel`]s (one per open group) and a stack of open environments.
//! Every token leaves with a [`ParserMark`] that says whether it is
//! translatable, how deeply it is nested in external arguments, which tag it
//! belongs to, and whether escapes apply.

use std::sync::Arc;

use texfilter_tables::{
    CommandTable, GROUP_COMMAND, INLINE_MATH_COMMAND, MASK_COMMAND, UNKNOWN_COMMAND,
};

use super::level::ParserLevel;
use super::token::{Environments, MarkedToken, ParserMark, Token, TokenKind};
use crate::error::FilterError;

/// Name reported when an `\end` arrives with no environment open.
const NO_ENVIRONMENT: &str = "not present";

/// Stateful token annotator. Call [`Parser::reset`] before each document.
#[derive(Debug)]
pub struct Parser<'t> {
    table: &'t CommandTable,
    /// Never empty: index 0 is the document level.
    levels: Vec<ParserLevel<'t>>,
    environments: Vec<String>,
    snapshot: Environments,
    last_tag_id: i32,
    masking: bool,
    previous: Option<TokenKind>,
}

impl<'t> Parser<'t> {
    /// A parser in its initial state.
    pub fn new(table: &'t CommandTable) -> Self {
        Self {
            table,
            levels: vec![ParserLevel::root()],
            environments: Vec::new(),
            snapshot: Arc::from([]),
            last_tag_id: 0,
            masking: false,
            previous: None,
        }
    }

    /// Restore the initial state.
    pub fn reset(&mut self) {
        self.levels.clear();
        self.levels.push(ParserLevel::root());
        self.environments.clear();
        self.snapshot = Arc::from([]);
        self.last_tag_id = 0;
        self.masking = false;
        self.previous = None;
    }

    /// Currently open environments, outermost first.
    pub fn environments(&self) -> &[String] {
        &self.environments
    }

    /// Number of levels including the document level.
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Highest tag id issued since the last reset.
    pub fn last_tag_id(&self) -> i32 {
        self.last_tag_id
    }

    fn top(&self) -> usize {
        self.levels.len() - 1
    }

    fn next_tag_id(&mut self) -> i32 {
        self.last_tag_id += 1;
        self.last_tag_id
    }

    fn in_table_environment(&self) -> bool {
        self.environments
            .last()
            .is_some_and(|env| self.table.is_table_environment(env))
    }

    /// Annotate one token. Tokens must arrive in document order.
    pub fn process_token<'a>(&mut self, mut token: Token<'a>) -> Result<MarkedToken<'a>, FilterError> {
        use TokenKind::*;

        let table = self.table;
        let kind = token.kind;
        let top = self.top();

        let level = &mut self.levels[top];
        let mut externality = level.externality;
        let mut translatable = level.translatable;
        let mut escape = level.escape;
        let mut tag_id = 0;

        // Only options and arguments keep a command alive.
        if !matches!(kind, GroupBegin | Options) {
            if level.command().is_some() {
                level.unregister_command();
            }
            level.option_consumer = false;
            level.argument_consumer = false;
        }

        match kind {
            Command => {
                if !self.levels[top].hidden {
                    let descriptor = match token.name.and_then(|n| table.lookup(n)) {
                        Some(d) => d,
                        None => {
                            token.name = Some(UNKNOWN_COMMAND);
                            table.get(UNKNOWN_COMMAND)
                        }
                    };
                    self.levels[top].register_command(descriptor);
                    if descriptor.is_format() {
                        tag_id = self.next_tag_id();
                        self.levels[top].tag_id = tag_id;
                    } else {
                        translatable = false;
                    }
                }
            }
            InlineMath => {
                if !self.levels[top].hidden {
                    token.name = Some(INLINE_MATH_COMMAND);
                    tag_id = self.next_tag_id();
                }
            }
            Options => {
                let after_command = self.previous == Some(Command);
                let in_table = self.in_table_environment();
                let level = &mut self.levels[top];
                if level.option_consumer {
                    translatable = false;
                    level.option_consumer = false;
                } else if after_command {
                    if level.has_format_command() {
                        tag_id = level.tag_id;
                    } else {
                        translatable = false;
                    }
                } else if in_table {
                    translatable = false;
                }
            }
            GroupBegin => {
                let level = &mut self.levels[top];
                let mut new_translatable = level.translatable && !level.argument_consumer;
                let mut new_escape = level.escape;
                let mut new_externality = level.externality;
                let mut new_hidden = level.hidden;

                if new_translatable
                    && !new_hidden
                    && let Some(arg) = level.fetch_argument()
                {
                    tag_id = level.tag_id;
                    new_hidden = !arg.translatable && level.has_format_command();
                    new_translatable = arg.translatable || new_hidden;
                    new_escape = arg.escape && !new_hidden;
                    if arg.external && new_translatable && !new_hidden {
                        new_externality += 1;
                    }
                    if level.has_plain_command() {
                        translatable = false;
                    }
                } else if new_translatable && !new_hidden {
                    // A bare group acts as a FORMAT command with one argument.
                    token.name = Some(GROUP_COMMAND);
                    level.register_command(table.get(GROUP_COMMAND));
                    level.fetch_argument();
                    self.last_tag_id += 1;
                    tag_id = self.last_tag_id;
                    level.tag_id = tag_id;
                } else if level.argument_consumer {
                    translatable = false;
                }

                let mut frame = ParserLevel::new(new_translatable, new_externality, new_escape, new_hidden);
                if new_hidden {
                    frame.tag_id = level.tag_id;
                }
                self.levels.push(frame);
            }
            GroupEnd => {
                if self.levels.len() > 1 {
                    self.levels.pop();
                }
                let top = self.top();
                let parent = &mut self.levels[top];
                externality = parent.externality;
                tag_id = parent.tag_id;
                if parent.has_plain_command() {
                    translatable = false;
                }
                if parent.command().is_some()
                    && !parent.has_argument_in_queue()
                    && !parent.argument_consumer
                {
                    parent.unregister_command();
                    tag_id = -tag_id;
                }
            }
            EnvBegin => {
                let name = token.name.unwrap_or_default();
                let level = &mut self.levels[top];
                if table.is_argument_consumer(name) {
                    level.argument_consumer = true;
                }
                if table.is_option_consumer(name) {
                    level.option_consumer = true;
                }
                self.environments.push(name.to_string());
                self.snapshot = Arc::from(self.environments.as_slice());
                translatable = false;
            }
            EnvEnd => {
                let found = token.name.unwrap_or_default();
                match self.environments.last() {
                    Some(open) if open == found => {
                        self.environments.pop();
                        self.snapshot = Arc::from(self.environments.as_slice());
                    }
                    open => {
                        return Err(FilterError::EnvironmentMismatch {
                            found: found.to_string(),
                            open: open.map_or_else(|| NO_ENVIRONMENT.to_string(), Clone::clone),
                            offset: token.start,
                        });
                    }
                }
                translatable = false;
            }
            Ampersand => {
                if self.in_table_environment() {
                    translatable = false;
                }
            }
            Verbatim => escape = false,
            DisplayMath | EmptyLine | Comment | LineBreak | Sentinel => translatable = false,
            Text | Whitespace => {}
        }

        // Inside external content, non-translatable tokens become opaque
        // mask tags; a run of them shares one tag id.
        if !translatable && externality > 0 {
            translatable = true;
            token.name = Some(MASK_COMMAND);
            if !self.masking {
                self.last_tag_id += 1;
            }
            tag_id = self.last_tag_id;
            self.masking = true;
        } else {
            self.masking = false;
        }

        let level = &self.levels[self.top()];
        if level.hidden {
            tag_id = level.tag_id;
            translatable = true;
            escape = false;
        }

        self.previous = Some(kind);
        tracing::trace!(
            kind = %kind,
            start = token.start,
            name = token.name,
            translatable,
            externality,
            tag_id,
            escape,
            "marked token"
        );
        Ok(MarkedToken {
            token,
            mark: ParserMark {
                translatable,
                externality,
                tag_id,
                escape,
                environments: Arc::clone(&self.snapshot),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::lexer::tokenize;

    fn marks(source: &str) -> Vec<MarkedToken<'_>> {
        let mut parser = Parser::new(CommandTable::builtin());
        tokenize(source)
            .into_iter()
            .map(|t| parser.process_token(t).unwrap())
            .collect()
    }

    fn find<'m, 'a>(marked: &'m [MarkedToken<'a>], text: &str) -> &'m MarkedToken<'a> {
        marked
            .iter()
            .find(|m| m.token.text == text)
            .unwrap_or_else(|| panic!("no token {text:?}"))
    }

    #[test]
    fn format_command_opens_and_closes_tag() {
        let m = marks("\\emph{x}");
        assert_eq!(m[0].mark.tag_id, 1);
        assert!(m[0].mark.translatable);
        assert_eq!(m[1].mark.tag_id, 1); // `{`
        assert_eq!(m[2].mark.tag_id, 0); // `x`
        assert_eq!(m[3].mark.tag_id, -1); // `}`
        assert!(!m[4].mark.translatable); // sentinel
    }

    #[test]
    fn unknown_command_is_renamed() {
        let m = marks("\\foobar{x}");
        assert_eq!(m[0].token.name, Some(UNKNOWN_COMMAND));
        assert_eq!(m[0].mark.tag_id, 1);
    }

    #[test]
    fn bare_group_becomes_virtual_command() {
        let m = marks("a {b} c");
        let open = find(&m, "{");
        assert_eq!(open.token.name, Some(GROUP_COMMAND));
        assert_eq!(open.mark.tag_id, 1);
        assert_eq!(find(&m, "}").mark.tag_id, -1);
    }

    #[test]
    fn control_command_consumes_options_and_arguments() {
        let m = marks("\\includegraphics[width=1cm]{a.png} b");
        for text in ["\\includegraphics", "[width=1cm]", "{", "a.png", "}"] {
            assert!(!find(&m, text).mark.translatable, "{text} should not be translatable");
        }
        assert!(find(&m, " b").mark.translatable);
    }

    #[test]
    fn content_command_argument_is_translatable_but_braces_are_not() {
        let m = marks("\\section{Title}");
        assert!(!m[0].mark.translatable);
        assert!(!find(&m, "{").mark.translatable);
        assert!(find(&m, "Title").mark.translatable);
        assert!(!find(&m, "}").mark.translatable);
    }

    #[test]
    fn footnote_content_is_external() {
        let m = marks("a\\footnote{b}");
        assert_eq!(find(&m, "b").mark.externality, 1);
        assert_eq!(find(&m, "}").mark.externality, 0);
        assert_eq!(find(&m, "}").mark.tag_id, -1);
    }

    #[test]
    fn masking_shares_id_within_run() {
        let m = marks("\\footnote{a\\label{x}b\\\\c\\\\ d}");
        let command = find(&m, "\\label");
        assert_eq!(command.token.name, Some(MASK_COMMAND));
        assert!(command.mark.translatable);
        // \label { x } all masked with one id
        let ids: Vec<i32> = m[3..7].iter().map(|t| t.mark.tag_id).collect();
        assert!(ids.iter().all(|&id| id == ids[0]), "{ids:?}");
        // the second line break is a separate run
        let breaks: Vec<i32> = m
            .iter()
            .filter(|t| t.token.kind == TokenKind::LineBreak)
            .map(|t| t.mark.tag_id)
            .collect();
        assert_eq!(breaks.len(), 2);
        assert_ne!(breaks[0], breaks[1]);
    }

    #[test]
    fn verb_body_is_hidden_inside_tag() {
        let m = marks("\\verb+x+");
        let id = m[0].mark.tag_id;
        assert!(id > 0);
        assert_eq!(m[1].mark.tag_id, id);
        assert_eq!(m[2].mark.tag_id, id);
        assert!(m[2].mark.translatable && !m[2].mark.escape);
        assert_eq!(m[3].mark.tag_id, -id);
    }

    #[test]
    fn environment_stack_and_snapshot() {
        let m = marks("\\begin{itemize}x\\end{itemize}");
        assert_eq!(&*m[1].mark.environments, ["itemize".to_string()]);
        assert!(m[2].mark.environments.is_empty());
    }

    #[test]
    fn mismatched_end_is_fatal() {
        let mut parser = Parser::new(CommandTable::builtin());
        let mut result = Ok(());
        for t in tokenize("\\begin{itemize}\\end{table}") {
            if let Err(e) = parser.process_token(t) {
                result = Err(e);
                break;
            }
        }
        match result {
            Err(FilterError::EnvironmentMismatch { found, open, offset }) => {
                assert_eq!(found, "table");
                assert_eq!(open, "itemize");
                assert_eq!(offset, 15);
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn ampersand_in_table_is_structure() {
        let m = marks("\\begin{tabular}{cc}a & b\\end{tabular} & c");
        let amps: Vec<bool> = m
            .iter()
            .filter(|t| t.token.kind == TokenKind::Ampersand)
            .map(|t| t.mark.translatable)
            .collect();
        assert_eq!(amps, vec![false, true]);
        assert!(!find(&m, "cc").mark.translatable);
    }

    #[test]
    fn options_after_format_command_join_its_tag() {
        let m = marks("\\textls[-50]{x}");
        assert_eq!(m[1].mark.tag_id, m[0].mark.tag_id);
        assert!(m[1].mark.translatable);
    }

    #[test]
    fn options_as_plain_text() {
        let m = marks("see [1] here");
        assert!(find(&m, "[1]").mark.translatable);
        assert_eq!(find(&m, "[1]").mark.tag_id, 0);
    }

    #[test]
    fn reset_restarts_tag_ids() {
        let table = CommandTable::builtin();
        let mut parser = Parser::new(table);
        for t in tokenize("\\emph{a}\\begin{itemize}") {
            parser.process_token(t).unwrap();
        }
        assert!(parser.last_tag_id() > 0);
        parser.reset();
        assert_eq!(parser.last_tag_id(), 0);
        assert!(parser.environments().is_empty());
        assert_eq!(parser.depth(), 1);
    }

    #[test]
    fn stray_group_end_stays_at_root() {
        let m = marks("a}b");
        assert_eq!(find(&m, "}").mark.tag_id, 0);
    }
}
