use std::collections::HashMap;

use texfilter_tables::CommandDescriptor;

/// Per-document inline tag allocation.
///
/// Identical source content always maps to the same tag, so a command that
/// repeats verbatim inside one document reuses its tag. Opening tags
/// remember their closing form, keyed both by the parser tag id and by the
/// opening tag itself.
#[derive(Debug, Default)]
pub struct TagAllocator {
    counters: HashMap<String, u32>,
    first_or_closed: HashMap<String, String>,
    closing_by_id: HashMap<i32, String>,
    closing_by_opening: HashMap<String, String>,
}

impl TagAllocator {
    /// An empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; numbering restarts at 1.
    pub fn reset(&mut self) {
        self.counters.clear();
        self.first_or_closed.clear();
        self.closing_by_id.clear();
        self.closing_by_opening.clear();
    }

    /// Tag for `content`: `<L/>` when `closed`, otherwise `<L>` with `</L>`
    /// registered under `tag_id`.
    ///
    /// Returns `None` only when the content is new and no descriptor is
    /// available to derive a label from.
    pub fn first_or_closed_tag(
        &mut self,
        content: &str,
        descriptor: Option<&CommandDescriptor>,
        tag_id: i32,
        closed: bool,
    ) -> Option<String> {
        if let Some(tag) = self.first_or_closed.get(content) {
            if !closed && let Some(closing) = self.closing_by_opening.get(tag) {
                self.closing_by_id.insert(tag_id, closing.clone());
            }
            return Some(tag.clone());
        }

        let descriptor = descriptor?;
        let mut label = descriptor.label().to_string();
        if descriptor.numbered_tags() {
            let counter = self.counters.entry(label.clone()).or_insert(0);
            *counter += 1;
            label.push_str(&counter.to_string());
        }

        let tag = if closed {
            format!("<{label}/>")
        } else {
            let opening = format!("<{label}>");
            let closing = format!("</{label}>");
            self.closing_by_opening.insert(opening.clone(), closing.clone());
            self.closing_by_id.insert(tag_id, closing);
            opening
        };
        self.first_or_closed.insert(content.to_string(), tag.clone());
        Some(tag)
    }

    /// Closing tag registered for `tag_id`.
    pub fn last_tag(&self, tag_id: i32) -> Option<&str> {
        self.closing_by_id.get(&tag_id).map(String::as_str)
    }
}
