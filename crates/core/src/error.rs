use std::collections::BTreeMap;

use texfilter_diagnostics::{Diagnostic, Span, codes};

/// Fatal conditions that stop processing a document.
///
/// Output written to the sink before the error stays there.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// `\end{found}` while `open` was the innermost environment.
    #[error("found end of environment {found} when last open environment was {open}")]
    EnvironmentMismatch {
        /// Environment named by the `\end`.
        found: String,
        /// Innermost open environment, or `not present`.
        open: String,
        /// Byte offset of the `\end` token.
        offset: usize,
    },
    /// A tag-bearing token run could not be turned into a tag.
    #[error("failed to create tag from `{content}` at byte {offset}; the document may be malformed")]
    TagAllocation {
        /// Source text of the run.
        content: String,
        /// Byte offset of the run.
        offset: usize,
    },
    /// A closing tag id without a registered opening tag.
    #[error("no opening tag registered for tag id {tag_id} (closing at byte {offset})")]
    UnpairedTag {
        /// The (positive) tag id being closed.
        tag_id: i32,
        /// Byte offset of the closing token.
        offset: usize,
    },
    /// The output sink refused a write.
    #[error("failed to write output")]
    Sink(#[from] std::fmt::Error),
}

impl FilterError {
    /// Byte offset in the source document, when the error has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            FilterError::EnvironmentMismatch { offset, .. }
            | FilterError::TagAllocation { offset, .. }
            | FilterError::UnpairedTag { offset, .. } => Some(*offset),
            FilterError::Sink(_) => None,
        }
    }

    /// Convert into a renderable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let id = match self {
            FilterError::EnvironmentMismatch { .. } => codes::PARSER_ENVIRONMENT_MISMATCH,
            FilterError::TagAllocation { .. } => codes::FILTER_TAG_ALLOCATION,
            FilterError::UnpairedTag { .. } => codes::FILTER_UNPAIRED_TAG,
            FilterError::Sink(_) => codes::FILTER_SINK,
        };
        let diag = Diagnostic::error(id, self.to_string(), self.offset().map(Span::empty));
        match self {
            FilterError::EnvironmentMismatch { found, open, .. } => diag.with_context(BTreeMap::from([
                ("found".to_string(), found.clone()),
                ("open".to_string(), open.clone()),
            ])),
            FilterError::TagAllocation { content, .. } => {
                diag.with_context(BTreeMap::from([("content".to_string(), content.clone())]))
            }
            FilterError::UnpairedTag { tag_id, .. } => {
                diag.with_context(BTreeMap::from([("tagId".to_string(), tag_id.to_string())]))
            }
            FilterError::Sink(_) => diag,
        }
    }
}
