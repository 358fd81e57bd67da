use std::cmp::Ordering;
use std::iter;

use texfilter_tables::{CommandDescriptor, CommandTable, GROUP_COMMAND};

use super::escape;
use super::providers::TranslationProvider;
use super::session::FilterOptions;
use super::tags::TagAllocator;
use crate::error::FilterError;
use crate::grammar::lexer::is_blank;
use crate::grammar::token::{MarkedToken, TokenKind};

/// Turns runs of translatable tokens into provider calls and reassembles the
/// translated text.
pub(crate) struct SegmentAssembler<'s, 'a, P: ?Sized> {
    pub(crate) source: &'a str,
    pub(crate) table: &'s CommandTable,
    pub(crate) tags: &'s mut TagAllocator,
    pub(crate) provider: &'s mut P,
    pub(crate) options: FilterOptions,
}

impl<'a, P> SegmentAssembler<'_, 'a, P>
where
    P: TranslationProvider + ?Sized,
{
    /// Translate one run and return the text that replaces it.
    pub(crate) fn translate_segment(
        &mut self,
        run: &[&MarkedToken<'a>],
    ) -> Result<String, FilterError> {
        let (Some(first), Some(last)) = (run.first(), run.last()) else {
            return Ok(String::new());
        };
        if run.len() == 1 && first.token.kind == TokenKind::Whitespace {
            return Ok(first.token.text.to_string());
        }

        let table = self.table;
        let base = first.mark.externality;
        let escape = first.mark.escape;
        let environments = &first.mark.environments;
        let sentinel = MarkedToken::sentinel(last.token.end, base);

        let mut buffer = String::new();
        let mut cache: Vec<&MarkedToken<'a>> = Vec::new();
        let mut tagged: Vec<(String, Vec<&MarkedToken<'a>>)> = Vec::new();
        let mut first_id = 0;
        let mut first_command: Option<&CommandDescriptor> = None;

        for token in run.iter().copied().chain(iter::once(&sentinel)) {
            let id = token.mark.tag_id;
            let ext = token.mark.externality;

            let flush = !cache.is_empty()
                && ((id == 0 && ext == base)
                    || (id > first_id && first_id > 0 && ext == base)
                    || (first_id < 0 && id != first_id)
                    || (first_command.is_some_and(CommandDescriptor::has_plain_argument)
                        && id == -first_id));
            if flush {
                let tag = self.request_tag(&cache)?;
                buffer.push_str(&tag);
                tagged.push((tag, std::mem::take(&mut cache)));
                first_id = 0;
                first_command = None;
            }

            if id != 0 || ext > base {
                if cache.is_empty() {
                    first_id = id;
                    first_command = token.token.name.map(|name| table.get(name));
                }
                cache.push(token);
            } else {
                buffer.push_str(token.token.text);
            }
        }

        let comment = (self.options.environment_comments && !environments.is_empty())
            .then(|| format!("Environments: {}", environments.join(" > ")));
        let mut translation = self.process_entry(&buffer, escape, comment.as_deref());

        // A tag stands for identical source wherever it repeats, so one replay
        // serves every occurrence.
        let mut replacements: Vec<(&String, String)> = Vec::with_capacity(tagged.len());
        for (tag, tokens) in &tagged {
            if replacements.iter().any(|(seen, _)| *seen == tag) {
                continue;
            }
            replacements.push((tag, self.replay(tokens, base)?));
        }
        for (tag, text) in replacements {
            translation = translation.replace(tag.as_str(), &text);
        }
        Ok(translation)
    }

    /// Source text behind a tag, with nested external runs translated.
    fn replay(&mut self, tokens: &[&MarkedToken<'a>], base: u32) -> Result<String, FilterError> {
        let end = tokens.last().map_or(0, |t| t.token.end);
        let tail = MarkedToken::sentinel(end, base);
        let mut text = String::new();
        let mut external: Vec<&MarkedToken<'a>> = Vec::new();
        for token in tokens.iter().copied().chain(iter::once(&tail)) {
            if token.mark.externality > base {
                external.push(token);
                continue;
            }
            if !external.is_empty() {
                text.push_str(&self.translate_segment(&external)?);
                external.clear();
            }
            text.push_str(token.token.text);
        }
        Ok(text)
    }

    fn request_tag(&mut self, cache: &[&MarkedToken<'a>]) -> Result<String, FilterError> {
        let (Some(first), Some(last)) = (cache.first(), cache.last()) else {
            return Err(FilterError::TagAllocation {
                content: String::new(),
                offset: 0,
            });
        };
        let table = self.table;
        let name = first.token.name;
        let descriptor = name.map(|n| table.get(n));
        let tag_id = first.mark.tag_id;
        let offset = first.token.start;
        let content = &self.source[first.token.start..last.token.end];
        let allocation_failed = || FilterError::TagAllocation {
            content: content.to_string(),
            offset,
        };

        let terminal = descriptor.is_none_or(|d| !d.has_plain_argument())
            || (cache.len() == 1 && name != Some(GROUP_COMMAND));
        if !terminal {
            return self
                .tags
                .first_or_closed_tag(content, descriptor, tag_id, false)
                .ok_or_else(allocation_failed);
        }

        match tag_id.cmp(&0) {
            Ordering::Greater => self
                .tags
                .first_or_closed_tag(content, descriptor, tag_id, true)
                .ok_or_else(allocation_failed),
            Ordering::Less => self
                .tags
                .last_tag(-tag_id)
                .map(str::to_string)
                .ok_or(FilterError::UnpairedTag {
                    tag_id: -tag_id,
                    offset,
                }),
            Ordering::Equal => Err(allocation_failed()),
        }
    }

    /// Unescape, trim, translate the core, reassemble and escape again.
    fn process_entry(&mut self, buffer: &str, escape: bool, comment: Option<&str>) -> String {
        let text = if escape {
            escape::unescape(buffer)
        } else {
            buffer.to_string()
        };
        let core_start = text.len() - text.trim_start_matches(is_blank).len();
        let core_end = text.trim_end_matches(is_blank).len().max(core_start);
        let core = &text[core_start..core_end];

        let translated = if core.is_empty() {
            String::new()
        } else {
            tracing::debug!(chars = core.chars().count(), escape, comment, "requesting translation");
            self.provider.translate(core, escape, comment)
        };

        let assembled = format!("{}{translated}{}", &text[..core_start], &text[core_end..]);
        if escape {
            escape::escape(&assembled)
        } else {
            assembled
        }
    }
}
