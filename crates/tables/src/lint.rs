//! Configuration checks.
//!
//! [`lint_config`] inspects a raw [`ConfigSource`] (duplicates are only
//! visible before the table is built) and reports problems as diagnostics.
//! Unlike table loading, lint keeps going after the first error so a user
//! sees every problem in one run.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use texfilter_diagnostics::{Diagnostic, codes};

use crate::source::{CommandEntrySource, ConfigSource};
use crate::{CommandKind, CommandTable, RESERVED_COMMANDS, TableError};

/// Tag labels used by the reserved commands, split into letters and number.
const RESERVED_LABELS: [(&str, Option<u32>); 4] =
    [("G", Some(0)), ("U", None), ("M", None), ("Math", None)];

/// Check configuration JSON. Parse failures surface as [`TableError`].
pub fn lint_config_str(json: &str) -> Result<Vec<Diagnostic>, TableError> {
    let source: ConfigSource = serde_json::from_str(json)?;
    Ok(lint_config(&source))
}

/// Check a parsed configuration for duplicate commands and tag label problems.
pub fn lint_config(source: &ConfigSource) -> Vec<Diagnostic> {
    let mut diags = Vec::new();
    let mut seen_commands = HashSet::new();
    let mut alpha_labels: HashSet<String> = HashSet::new();
    let mut numbered_labels: HashMap<String, BTreeSet<u32>> = HashMap::new();

    for (letters, number) in RESERVED_LABELS {
        match number {
            Some(n) => {
                numbered_labels.entry(letters.to_string()).or_default().insert(n);
            }
            None => {
                alpha_labels.insert(letters.to_string());
            }
        }
    }

    for group in &source.all_commands {
        for entry in &group.commands {
            let name = entry.name();
            if RESERVED_COMMANDS.contains(&name) {
                diags.push(
                    Diagnostic::warn(
                        codes::CONFIG_RESERVED_NAME,
                        format!("command <{name}> is reserved and will be replaced by the built-in definition"),
                        None,
                    )
                    .with_context(ctx(name, None)),
                );
            }
            if !seen_commands.insert(name.to_string()) {
                diags.push(
                    Diagnostic::warn(
                        codes::CONFIG_DUPLICATE_COMMAND,
                        format!("command <{name}> has a duplicate entry"),
                        None,
                    )
                    .with_context(ctx(name, None)),
                );
                continue;
            }
            if group.kind != CommandKind::Format {
                continue;
            }
            let Some(tag) = entry.tag() else {
                diags.push(
                    Diagnostic::error(
                        codes::CONFIG_MISSING_TAG,
                        format!("command <{name}> has FORMAT type and must have a <tag> property"),
                        None,
                    )
                    .with_context(ctx(name, None)),
                );
                continue;
            };
            let Some((letters, number)) = split_label(tag) else {
                diags.push(
                    Diagnostic::error(
                        codes::CONFIG_INVALID_TAG,
                        format!("tag <{tag}> doesn't match the label pattern ^[A-Za-z]+[0-9]*$"),
                        None,
                    )
                    .with_context(ctx(name, Some(tag))),
                );
                continue;
            };

            match number {
                None => {
                    if !has_external_argument(entry) {
                        diags.push(
                            Diagnostic::warn(
                                codes::CONFIG_UNNUMBERED_TAG,
                                format!(
                                    "command <{name}> has unnumbered tag <{tag}> which is reserved for commands with an external argument"
                                ),
                                None,
                            )
                            .with_context(ctx(name, Some(tag))),
                        );
                    }
                    if alpha_labels.contains(tag) {
                        diags.push(duplicate_tag(name, tag));
                        continue;
                    }
                    if numbered_labels
                        .get(tag)
                        .and_then(|set| set.last())
                        .is_some_and(|&max| max > 0)
                    {
                        diags.push(
                            Diagnostic::error(
                                codes::CONFIG_TAG_CONFLICT,
                                format!("tag <{tag}> conflicts with other numbered tag(s)"),
                                None,
                            )
                            .with_context(ctx(name, Some(tag))),
                        );
                        continue;
                    }
                    alpha_labels.insert(tag.to_string());
                }
                Some(n) => {
                    let taken = numbered_labels.entry(letters.to_string()).or_default();
                    if taken.contains(&n) {
                        diags.push(duplicate_tag(name, tag));
                        continue;
                    }
                    if n > 0 && alpha_labels.contains(letters) {
                        diags.push(
                            Diagnostic::error(
                                codes::CONFIG_TAG_CONFLICT,
                                format!("tag <{tag}> conflicts with unnumbered tag <{letters}>"),
                                None,
                            )
                            .with_context(ctx(name, Some(tag))),
                        );
                        continue;
                    }
                    taken.insert(n);
                }
            }
        }
    }
    diags
}

/// Commands used in `document` that `table` does not declare, sorted.
///
/// `\begin` and `\end` are never reported. A command counts as used when an
/// unescaped backslash is followed by at least two lowercase letters.
pub fn scan_unknown_commands(table: &CommandTable, document: &str) -> Vec<String> {
    let bytes = document.as_bytes();
    let mut unknown = BTreeSet::new();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'\\' || (i > 0 && bytes[i - 1] == b'\\') {
            continue;
        }
        let start = i + 1;
        let len = bytes[start..]
            .iter()
            .take_while(|c| c.is_ascii_lowercase())
            .count();
        if len < 2 {
            continue;
        }
        let name = &document[start..start + len];
        if name != "begin" && name != "end" && !table.contains(name) {
            unknown.insert(name.to_string());
        }
    }
    unknown.into_iter().collect()
}

fn split_label(tag: &str) -> Option<(&str, Option<u32>)> {
    let split = tag
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(tag.len());
    let (letters, digits) = tag.split_at(split);
    if letters.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.is_empty() {
        return Some((letters, None));
    }
    digits.parse().ok().map(|n| (letters, Some(n)))
}

fn has_external_argument(entry: &CommandEntrySource) -> bool {
    match entry {
        CommandEntrySource::Detailed(d) => d
            .args
            .iter()
            .flatten()
            .flatten()
            .any(|a| a.external),
        CommandEntrySource::Name(_) => false,
    }
}

fn duplicate_tag(name: &str, tag: &str) -> Diagnostic {
    Diagnostic::error(
        codes::CONFIG_DUPLICATE_TAG,
        format!("tag <{tag}> has a duplicate entry"),
        None,
    )
    .with_context(ctx(name, Some(tag)))
}

fn ctx(command: &str, tag: Option<&str>) -> BTreeMap<String, String> {
    let mut map = BTreeMap::from([("command".to_string(), command.to_string())]);
    if let Some(tag) = tag {
        map.insert("tag".to_string(), tag.to_string());
    }
    map
}
