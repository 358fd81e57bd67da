use std::fmt;

use texfilter_tables::CommandTable;

use super::assemble::SegmentAssembler;
use super::providers::{Segment, SegmentCollector, TranslationProvider};
use super::tags::TagAllocator;
use crate::error::FilterError;
use crate::grammar::lexer::tokenize;
use crate::grammar::parser::Parser;
use crate::grammar::token::MarkedToken;

/// Knobs that change what the provider sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOptions {
    /// Send `Environments: a > b` comments along with segments inside
    /// environments.
    pub environment_comments: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            environment_comments: true,
        }
    }
}

/// Everything needed to filter documents against one command table.
///
/// All per-document state is reset at the start of each document, so one
/// session can process any number of documents in sequence.
#[derive(Debug)]
pub struct FilterSession<'t> {
    table: &'t CommandTable,
    parser: Parser<'t>,
    tags: TagAllocator,
    options: FilterOptions,
}

impl<'t> FilterSession<'t> {
    /// A session with default options.
    pub fn new(table: &'t CommandTable) -> Self {
        Self::with_options(table, FilterOptions::default())
    }

    /// A session with explicit options.
    pub fn with_options(table: &'t CommandTable, options: FilterOptions) -> Self {
        Self {
            table,
            parser: Parser::new(table),
            tags: TagAllocator::new(),
            options,
        }
    }

    /// Options in effect.
    pub fn options(&self) -> FilterOptions {
        self.options
    }

    /// Command table in use.
    pub fn table(&self) -> &'t CommandTable {
        self.table
    }

    /// Clear parser state and tag numbering.
    pub fn reset(&mut self) {
        self.parser.reset();
        self.tags.reset();
    }

    /// Translate `source` into `out`.
    ///
    /// Non-translatable tokens are copied through; each maximal run of
    /// translatable tokens goes through the provider. On error, everything
    /// written before the failing token stays in `out`.
    pub fn process_document<P, W>(
        &mut self,
        source: &str,
        provider: &mut P,
        out: &mut W,
    ) -> Result<(), FilterError>
    where
        P: TranslationProvider + ?Sized,
        W: fmt::Write + ?Sized,
    {
        let _span = tracing::debug_span!("document", bytes = source.len()).entered();
        self.reset();

        let mut assembler = SegmentAssembler {
            source,
            table: self.table,
            tags: &mut self.tags,
            provider,
            options: self.options,
        };
        let mut run: Vec<MarkedToken<'_>> = Vec::new();
        for token in tokenize(source) {
            let marked = self.parser.process_token(token)?;
            if marked.mark.translatable {
                run.push(marked);
                continue;
            }
            if !run.is_empty() {
                let refs: Vec<&MarkedToken<'_>> = run.iter().collect();
                out.write_str(&assembler.translate_segment(&refs)?)?;
                run.clear();
            }
            out.write_str(marked.token.text)?;
        }
        Ok(())
    }

    /// Tokenize and mark `source` without translating it.
    pub fn mark_tokens<'a>(&mut self, source: &'a str) -> Result<Vec<MarkedToken<'a>>, FilterError> {
        self.reset();
        tokenize(source)
            .into_iter()
            .map(|token| self.parser.process_token(token))
            .collect()
    }
}

/// Translate a whole document into a new string.
pub fn translate_str<P>(
    source: &str,
    table: &CommandTable,
    provider: &mut P,
) -> Result<String, FilterError>
where
    P: TranslationProvider + ?Sized,
{
    let mut out = String::with_capacity(source.len());
    FilterSession::new(table).process_document(source, provider, &mut out)?;
    Ok(out)
}

/// Every segment a translator would be asked for, in call order.
pub fn extract_segments(source: &str, table: &CommandTable) -> Result<Vec<Segment>, FilterError> {
    let mut collector = SegmentCollector::new();
    let mut sink = String::new();
    FilterSession::new(table).process_document(source, &mut collector, &mut sink)?;
    Ok(collector.into_segments())
}
