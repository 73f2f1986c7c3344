//! Utility functions for diagnostics output

use std::collections::HashMap;

pub const TRUNCATE_LIMIT: usize = 50;

/// Shorten `text` to at most 50 characters, ending in `…` when cut
pub fn truncate(text: &str) -> String {
    if text.chars().count() > TRUNCATE_LIMIT {
        let mut short: String = text.chars().take(TRUNCATE_LIMIT - 1).collect();
        short.push('…');
        short
    } else {
        text.to_string()
    }
}

/// Lines of `before` that no longer appear in `after`, each prefixed with
/// `- `. Repeated lines are matched by count, so removing one of two
/// identical lines reports it once.
pub fn removed_lines(before: &str, after: &str) -> String {
    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for line in after.lines() {
        *remaining.entry(line).or_insert(0) += 1;
    }

    let mut report = String::new();
    for line in before.lines() {
        match remaining.get_mut(line) {
            Some(count) if *count > 0 => *count -= 1,
            _ => {
                report.push_str("- ");
                report.push_str(line);
                report.push('\n');
            }
        }
    }

    report
}

/// Whether `name` is usable as a JavaScript identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}
