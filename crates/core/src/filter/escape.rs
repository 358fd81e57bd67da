//! LaTeX special-character escaping around translation.
//!
//! Before a segment goes to the translator, `\%`-style escapes are undone and
//! `~` becomes a no-break space; afterwards the reverse happens. Rules apply in
//! sequence, each over the output of the previous one. A guarded rule skips
//! occurrences directly preceded by a backslash.

/// `(pattern, replacement, guarded)`.
type Rule = (&'static str, &'static str, bool);

const UNESCAPE_RULES: [Rule; 7] = [
    ("\\%", "%", true),
    ("\\$", "$", true),
    ("\\_", "_", true),
    ("\\#", "#", true),
    ("\\&", "&", true),
    ("~", "\u{a0}", true),
    ("\\~{}", "~", true),
];

const ESCAPE_RULES: [Rule; 7] = [
    ("%", "\\%", true),
    ("$", "\\$", true),
    ("_", "\\_", true),
    ("#", "\\#", true),
    ("&", "\\&", true),
    ("~", "\\~{}", false),
    ("\u{a0}", "~", false),
];

fn apply(text: &str, rules: &[Rule]) -> String {
    let mut current = text.to_string();
    for &(pattern, replacement, guarded) in rules {
        current = if guarded {
            replace_unescaped(&current, pattern, replacement)
        } else {
            current.replace(pattern, replacement)
        };
    }
    current
}

/// Replace non-overlapping occurrences of `pattern` that are not directly
/// preceded by a backslash.
fn replace_unescaped(text: &str, pattern: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search = 0;
    while let Some(found) = text[search..].find(pattern) {
        let at = search + found;
        if at > 0 && text.as_bytes()[at - 1] == b'\\' {
            // Resume right after the first character of the rejected match.
            search = at + text[at..].chars().next().map_or(1, char::len_utf8);
            continue;
        }
        out.push_str(&text[last..at]);
        out.push_str(replacement);
        last = at + pattern.len();
        search = last;
    }
    out.push_str(&text[last..]);
    out
}

/// Undo LaTeX escapes before translation.
pub fn unescape(text: &str) -> String {
    apply(text, &UNESCAPE_RULES)
}

/// Re-apply LaTeX escapes after translation.
pub fn escape(text: &str) -> String {
    apply(text, &ESCAPE_RULES)
}
