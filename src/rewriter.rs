//! Call-site rewriter: replaces `extractor(icon)` calls with embedded literals

use crate::encoder::EncodedIcon;
use crate::error::{Diagnostic, EmbedError, Result};
use crate::types::IconIdentifier;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// How the argument of an extractor call is delimited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ArgumentScan {
    /// Argument runs to the matching `)`, honoring nesting and string literals
    #[default]
    Balanced,
    /// Argument is a maximal run of non-whitespace characters.
    /// Nested parentheses are not supported in this mode.
    NonWhitespace,
}

/// Result of one rewrite pass
#[derive(Debug, Clone, Default)]
pub struct RewriteOutput {
    pub text: String,
    /// Identifiers whose call sites were replaced, in source order
    pub matches: Vec<IconIdentifier>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RewriteOutput {
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::NotFound { identifier } => Some(identifier.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CallSiteRewriter {
    name: String,
    scan: ArgumentScan,
    pattern: Option<Regex>,
}

impl CallSiteRewriter {
    pub fn new(name: &str, scan: ArgumentScan) -> Result<Self> {
        if name.is_empty() {
            return Err(EmbedError::config("extractor name cannot be empty"));
        }

        let pattern = match scan {
            ArgumentScan::Balanced => None,
            ArgumentScan::NonWhitespace => {
                let source = format!(r"{}\((\S+)\)", regex::escape(name));
                Some(Regex::new(&source).map_err(|e| EmbedError::InvalidFormat {
                    message: format!("Invalid extractor pattern for '{}': {}", name, e),
                })?)
            }
        };

        Ok(Self {
            name: name.to_string(),
            scan,
            pattern,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scan(&self) -> ArgumentScan {
        self.scan
    }

    /// Replace every resolvable call site in `text`.
    ///
    /// `resolve` receives the last dot-separated segment of the argument and
    /// returns `None` when the icon is unknown; such call sites are kept
    /// verbatim and reported as [`Diagnostic::NotFound`].
    pub fn rewrite<F>(&self, text: &str, resolve: F) -> RewriteOutput
    where
        F: FnMut(&str) -> Option<EncodedIcon>,
    {
        match &self.pattern {
            Some(pattern) => rewrite_with_pattern(pattern, text, resolve),
            None => self.rewrite_balanced(text, resolve),
        }
    }

    fn rewrite_balanced<F>(&self, text: &str, mut resolve: F) -> RewriteOutput
    where
        F: FnMut(&str) -> Option<EncodedIcon>,
    {
        let mut output = RewriteOutput {
            text: String::with_capacity(text.len()),
            ..Default::default()
        };
        let mut cursor = 0;
        let mut search = 0;

        while let Some(found) = text[search..].find(&self.name) {
            let start = search + found;
            let open = start + self.name.len();

            if !starts_identifier(text, start) || text.as_bytes().get(open) != Some(&b'(') {
                search = open;
                continue;
            }

            // Unclosed call, e.g. inside a comment: later calls may still balance
            let Some(close) = find_closing_paren(text.as_bytes(), open) else {
                log::debug!("Unbalanced {}( at byte {}, skipped", self.name, start);
                search = open;
                continue;
            };
            let end = close + 1;

            let identifier = icon_identifier(&text[open + 1..close]);
            if let Some(literal) = resolve_call(identifier, &mut resolve, &mut output) {
                output.text.push_str(&text[cursor..start]);
                output.text.push_str(&literal);
                cursor = end;
            }
            search = end;
        }

        output.text.push_str(&text[cursor..]);
        output
    }
}

fn rewrite_with_pattern<F>(pattern: &Regex, text: &str, mut resolve: F) -> RewriteOutput
where
    F: FnMut(&str) -> Option<EncodedIcon>,
{
    let mut output = RewriteOutput::default();
    let rewritten = pattern
        .replace_all(text, |caps: &Captures| {
            let identifier = icon_identifier(&caps[1]);
            resolve_call(identifier, &mut resolve, &mut output)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned();
    output.text = rewritten;
    output
}

/// Look up one identifier and record the outcome
fn resolve_call<F>(identifier: &str, resolve: &mut F, output: &mut RewriteOutput) -> Option<String>
where
    F: FnMut(&str) -> Option<EncodedIcon>,
{
    let encoded = if identifier.is_empty() {
        None
    } else {
        resolve(identifier)
    };

    match encoded {
        Some(encoded) => {
            let literal = encoded.to_literal();
            log::debug!("Replaced {} with {}", identifier, crate::utils::truncate(&literal));
            output.matches.push(identifier.to_string());
            output.diagnostics.push(Diagnostic::Replaced {
                identifier: identifier.to_string(),
                literal: literal.clone(),
            });
            Some(literal)
        }
        None => {
            log::debug!("Icon '{}' not found, call left in place", identifier);
            output.diagnostics.push(Diagnostic::NotFound {
                identifier: identifier.to_string(),
            });
            None
        }
    }
}

/// Last dot-separated segment of a call argument, unquoted if it is a
/// plain string literal
pub fn icon_identifier(argument: &str) -> &str {
    let argument = argument.trim();
    let unquoted = ['\'', '"', '`'].iter().find_map(|&quote| {
        argument
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    });
    let reference = unquoted.unwrap_or(argument);
    reference.rsplit('.').next().unwrap_or(reference).trim()
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

/// True when `start` begins a free-standing identifier: neither part of a
/// longer identifier nor a property access such as `obj.name`
fn starts_identifier(text: &str, start: usize) -> bool {
    !text[..start]
        .chars()
        .next_back()
        .is_some_and(|ch| ch == '.' || is_identifier_char(ch))
}

/// Byte offset of the `)` matching the `(` at `open`.
///
/// Quoted strings and template literals are skipped whole; `()`, `[]` and
/// `{}` all count towards nesting depth.
fn find_closing_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;

    for (i, &byte) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == q {
                quote = None;
            }
            continue;
        }

        match byte {
            b'\'' | b'"' | b'`' => quote = Some(byte),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (byte == b')').then_some(i);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use crate::types::{IconDefinition, IconPack};

    fn dataset() -> IconPack {
        let mut pack = IconPack::new();
        pack.insert("faAt".to_string(), IconDefinition::new(512, 512, "M1 1H2V2H1Z"));
        pack.insert("faHouse".to_string(), IconDefinition::new(576, 512, "M0 0L9 9"));
        pack
    }

    fn rewrite(text: &str, scan: ArgumentScan) -> RewriteOutput {
        let pack = dataset();
        CallSiteRewriter::new("extractIcon", scan)
            .unwrap()
            .rewrite(text, |id| pack.get(id).map(encode))
    }

    #[test]
    fn test_rewrite_namespaced_reference() {
        for scan in [ArgumentScan::Balanced, ArgumentScan::NonWhitespace] {
            let output = rewrite("extractIcon(dataset.faAt)", scan);
            assert_eq!(output.text, "'SVG;0 0 512 512;M1 1H2V2H1Z;;;'");
            assert_eq!(output.matches, vec!["faAt"]);
        }
    }

    #[test]
    fn test_unresolved_call_left_intact() {
        for scan in [ArgumentScan::Balanced, ArgumentScan::NonWhitespace] {
            let output = rewrite("extractIcon(dataset.unknownGlyph)", scan);
            assert_eq!(output.text, "extractIcon(dataset.unknownGlyph)");
            assert!(output.matches.is_empty());
            assert_eq!(output.unresolved().collect::<Vec<_>>(), vec!["unknownGlyph"]);
        }
    }

    #[test]
    fn test_rewrite_multiple_calls_multiline() {
        let source = "export const icons = {\n  at: extractIcon(faAt),\n  home: extractIcon(fas.faHouse),\n  gone: extractIcon(faGone),\n};\n";
        let output = rewrite(source, ArgumentScan::Balanced);
        assert_eq!(
            output.text,
            "export const icons = {\n  at: 'SVG;0 0 512 512;M1 1H2V2H1Z;;;',\n  home: 'SVG;0 0 576 512;M0 0L9 9;;;',\n  gone: extractIcon(faGone),\n};\n"
        );
        assert_eq!(output.matches, vec!["faAt", "faHouse"]);
        assert_eq!(output.unresolved().count(), 1);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let source = "const a = extractIcon(faAt);\nconst b = extractIcon(faMissing);\n";
        let first = rewrite(source, ArgumentScan::Balanced);
        let second = rewrite(&first.text, ArgumentScan::Balanced);
        assert_eq!(first.text, second.text);
        assert!(second.matches.is_empty());
    }

    #[test]
    fn test_balanced_scan_handles_nesting() {
        let output = rewrite("f(extractIcon(pick(icons, 'x').faAt), 1)", ArgumentScan::Balanced);
        assert_eq!(output.text, "f('SVG;0 0 512 512;M1 1H2V2H1Z;;;', 1)");

        let output = rewrite("extractIcon( 'faHouse' )", ArgumentScan::Balanced);
        assert_eq!(output.text, "'SVG;0 0 576 512;M0 0L9 9;;;'");
    }

    #[test]
    fn test_non_whitespace_scan_limitation() {
        // The whitespace inside the argument prevents a match entirely
        let output = rewrite("extractIcon( faAt )", ArgumentScan::NonWhitespace);
        assert_eq!(output.text, "extractIcon( faAt )");
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_identifier_boundary() {
        let source = "myextractIcon(faAt); obj.extractIcon(faAt); obj?.extractIcon(faAt)";
        let output = rewrite(source, ArgumentScan::Balanced);
        assert_eq!(output.text, source);
        assert!(output.diagnostics.is_empty());

        let output = rewrite("[extractIcon(faAt)]", ArgumentScan::Balanced);
        assert_eq!(output.text, "['SVG;0 0 512 512;M1 1H2V2H1Z;;;']");
    }

    #[test]
    fn test_unclosed_call_does_not_hide_later_calls() {
        let source = "extractIcon(faAt\nconst x = 1;";
        let output = rewrite(source, ArgumentScan::Balanced);
        assert_eq!(output.text, source);
        assert!(output.matches.is_empty());

        let output = rewrite(
            "/* extractIcon(faAt */\nconst a = extractIcon(faHouse);\n",
            ArgumentScan::Balanced,
        );
        assert_eq!(
            output.text,
            "/* extractIcon(faAt */\nconst a = 'SVG;0 0 576 512;M0 0L9 9;;;';\n"
        );
        assert_eq!(output.matches, vec!["faHouse"]);
    }

    #[test]
    fn test_icon_identifier() {
        assert_eq!(icon_identifier("dataset.faAt"), "faAt");
        assert_eq!(icon_identifier(" faAt "), "faAt");
        assert_eq!(icon_identifier("\"faAt\""), "faAt");
        assert_eq!(icon_identifier("a.b.c"), "c");
        assert_eq!(icon_identifier(""), "");
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(CallSiteRewriter::new("", ArgumentScan::Balanced).is_err());
    }

    #[test]
    fn test_find_closing_paren() {
        assert_eq!(find_closing_paren(b"f(a)", 1), Some(3));
        assert_eq!(find_closing_paren(b"f(\")\")", 1), Some(5));
        assert_eq!(find_closing_paren(b"f([)", 1), None);
        assert_eq!(find_closing_paren(b"f(a", 1), None);
    }
}
