//! Property-based tests for the tokenizer and the filter round trip.

use proptest::prelude::*;
use texfilter_core::{CommandTable, IdentityProvider, TokenKind, tokenize, translate_str};

/// A well-formed LaTeX fragment built from constructs the filter tags.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ,.]{1,12}",
        Just("\n\n".to_string()),
        Just("\\\\ ".to_string()),
        Just("5\\% ".to_string()),
        Just("~".to_string()),
        "[a-z ]{1,8}".prop_map(|s| format!("\\textbf{{{s}}}")),
        "[a-z ]{1,8}".prop_map(|s| format!("\\emph{{{s}}}")),
        "[a-z ]{1,8}".prop_map(|s| format!("\\footnote{{{s}}}")),
        "[a-z ]{1,8}".prop_map(|s| format!("\\section{{{s}}}")),
        "[a-z ]{1,8}".prop_map(|s| format!("\\foobar{{{s}}}")),
        "[a-z ]{1,8}".prop_map(|s| format!("{{{s}}}")),
        "[a-z]{1,6}".prop_map(|s| format!("\\label{{{s}}}")),
        "[a-z]{1,6}".prop_map(|s| format!("${s}$")),
        "[a-z ]{0,10}".prop_map(|s| format!("% {s}\n")),
    ]
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..20).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn tokens_cover_input_in_order(text in "[a-z{}\\[\\]$%&~\\\\ \n]{0,80}") {
        let tokens = tokenize(&text);
        let mut cursor = 0;
        for token in &tokens {
            prop_assert_eq!(token.start, cursor);
            prop_assert_eq!(token.text, &text[token.start..token.end]);
            cursor = token.end;
        }
        prop_assert_eq!(cursor, text.len());
        let last = tokens.last().unwrap();
        prop_assert_eq!(last.kind, TokenKind::Sentinel);
        prop_assert_eq!(last.start, text.len());
    }

    #[test]
    fn tokenizer_accepts_any_text(text in any::<String>()) {
        let tokens = tokenize(&text);
        let covered: usize = tokens.iter().map(|t| t.end - t.start).sum();
        prop_assert_eq!(covered, text.len());
    }

    #[test]
    fn identity_provider_reproduces_document(doc in document()) {
        let out = translate_str(&doc, CommandTable::builtin(), &mut IdentityProvider).unwrap();
        prop_assert_eq!(out, doc);
    }

    #[test]
    fn filter_never_panics(text in "[a-z{}\\[\\]$%&~\\\\ \n]{0,80}") {
        let _ = translate_str(&text, CommandTable::builtin(), &mut IdentityProvider);
    }
}
