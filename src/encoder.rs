//! Icon encoder: turns an icon definition into the `SVG;...` micro-format
//!
//! The encoded string always has six `;`-delimited fields:
//!
//! ```text
//! SVG;<view box>;<path data>;<fill>;<stroke width>;<fill rule>
//! ```
//!
//! An empty field means "use the renderer default". The layout carries no
//! version marker, so this is the only field order produced or decoded here.

use crate::types::{IconDefinition, ENCODED_FIELD_COUNT, ENCODED_SEPARATOR, ENCODED_TAG};
use std::fmt;
use std::sync::Arc;

/// The five positional fields following the `SVG` tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconFields {
    pub view_box: String,
    pub path: String,
    pub fill: String,
    pub stroke_width: String,
    pub fill_rule: String,
}

impl IconFields {
    /// Fields with only the view box and path data set
    pub fn outline(definition: &IconDefinition) -> Self {
        Self {
            view_box: definition
                .view_box
                .clone()
                .unwrap_or_else(|| format!("0 0 {} {}", definition.width(), definition.height())),
            path: definition.paths().join(" "),
            ..Default::default()
        }
    }

    /// Fields carrying every attribute the definition supplies
    pub fn full(definition: &IconDefinition) -> Self {
        Self {
            fill: definition.fill.clone().unwrap_or_default(),
            stroke_width: definition.stroke_width.clone().unwrap_or_default(),
            fill_rule: definition.fill_rule.clone().unwrap_or_default(),
            ..Self::outline(definition)
        }
    }
}

/// A string in the `SVG;f1;f2;f3;f4;f5` format
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedIcon(String);

impl EncodedIcon {
    pub fn from_fields(fields: &IconFields) -> Self {
        let parts = [
            &fields.view_box,
            &fields.path,
            &fields.fill,
            &fields.stroke_width,
            &fields.fill_rule,
        ];

        let mut encoded = String::from(ENCODED_TAG);
        for part in parts {
            encoded.push(ENCODED_SEPARATOR);
            // A separator inside a field would shift every later position
            encoded.extend(part.chars().filter(|&c| c != ENCODED_SEPARATOR));
        }

        Self(encoded)
    }

    /// Parse an encoded string, returning `None` unless it has the `SVG` tag
    /// and exactly six fields
    pub fn parse(encoded: &str) -> Option<Self> {
        let fields: Vec<&str> = encoded.split(ENCODED_SEPARATOR).collect();
        if fields.len() != ENCODED_FIELD_COUNT || fields[0] != ENCODED_TAG {
            return None;
        }
        Some(Self(encoded.to_string()))
    }

    pub fn decode(&self) -> IconFields {
        let mut parts = self.0.split(ENCODED_SEPARATOR).skip(1);
        let mut next = || parts.next().unwrap_or_default().to_string();
        IconFields {
            view_box: next(),
            path: next(),
            fill: next(),
            stroke_width: next(),
            fill_rule: next(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The encoded string as a single-quoted JavaScript string literal
    pub fn to_literal(&self) -> String {
        let mut literal = String::with_capacity(self.0.len() + 2);
        literal.push('\'');
        for ch in self.0.chars() {
            match ch {
                '\'' => literal.push_str("\\'"),
                '\\' => literal.push_str("\\\\"),
                '\n' => literal.push_str("\\n"),
                '\r' => literal.push_str("\\r"),
                _ => literal.push(ch),
            }
        }
        literal.push('\'');
        literal
    }
}

impl fmt::Display for EncodedIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type CustomExtractor = Arc<dyn Fn(&IconDefinition) -> IconFields + Send + Sync>;

/// Strategy used to turn an icon definition into its encoded form
#[derive(Clone)]
pub enum Extractor {
    /// View box, path data, fill, stroke width and fill rule
    Standard,
    /// View box and path data only
    PathOnly,
    /// User-supplied field builder
    Custom(CustomExtractor),
}

impl Extractor {
    pub const STRATEGY_NAMES: &'static [&'static str] = &["standard", "path-only"];

    /// Look up a built-in strategy by its configuration name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::Standard),
            "path-only" => Some(Self::PathOnly),
            _ => None,
        }
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&IconDefinition) -> IconFields + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub fn fields(&self, definition: &IconDefinition) -> IconFields {
        match self {
            Extractor::Standard => IconFields::full(definition),
            Extractor::PathOnly => IconFields::outline(definition),
            Extractor::Custom(f) => f(definition),
        }
    }

    pub fn encode(&self, definition: &IconDefinition) -> EncodedIcon {
        EncodedIcon::from_fields(&self.fields(definition))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::Standard
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::Standard => f.write_str("Standard"),
            Extractor::PathOnly => f.write_str("PathOnly"),
            Extractor::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Encode with the standard strategy
pub fn encode(definition: &IconDefinition) -> EncodedIcon {
    Extractor::Standard.encode(definition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> IconDefinition {
        IconDefinition::new(512, 512, "M1 1H2V2H1Z")
    }

    #[test]
    fn test_encode_plain_icon() {
        let encoded = encode(&square());
        assert_eq!(encoded.as_str(), "SVG;0 0 512 512;M1 1H2V2H1Z;;;");
        assert_eq!(encoded.as_str().split(';').count(), ENCODED_FIELD_COUNT);
    }

    #[test]
    fn test_encode_with_metadata() {
        let mut def = square();
        def.view_box = Some("0 0 24 24".to_string());
        def.fill = Some("none".to_string());
        def.stroke_width = Some("2".to_string());
        def.fill_rule = Some("evenodd".to_string());

        assert_eq!(
            encode(&def).as_str(),
            "SVG;0 0 24 24;M1 1H2V2H1Z;none;2;evenodd"
        );
        assert_eq!(
            Extractor::PathOnly.encode(&def).as_str(),
            "SVG;0 0 24 24;M1 1H2V2H1Z;;;"
        );
    }

    #[test]
    fn test_multiple_paths_joined() {
        let mut def = square();
        def.icon.4 = crate::types::PathData::Multiple(vec!["M0 0h1".into(), "M2 2h1".into()]);
        assert_eq!(encode(&def).decode().path, "M0 0h1 M2 2h1");
    }

    #[test]
    fn test_decode_recovers_fields() {
        let mut def = square();
        def.fill = Some("#ff0000".to_string());
        def.fill_rule = Some("nonzero".to_string());

        let fields = IconFields::full(&def);
        assert_eq!(EncodedIcon::from_fields(&fields).decode(), fields);
    }

    #[test]
    fn test_separator_in_field_is_dropped() {
        let fields = IconFields {
            fill: "red;blue".to_string(),
            ..Default::default()
        };
        let encoded = EncodedIcon::from_fields(&fields);
        assert_eq!(encoded.as_str(), "SVG;;;redblue;;");
        assert!(EncodedIcon::parse(encoded.as_str()).is_some());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(EncodedIcon::parse("SVG;a;b;c;d;e").is_some());
        assert!(EncodedIcon::parse("SVG;a;b").is_none());
        assert!(EncodedIcon::parse("PNG;a;b;c;d;e").is_none());
        assert!(EncodedIcon::parse("SVG;a;b;c;d;e;f").is_none());
    }

    #[test]
    fn test_custom_extractor() {
        let extractor = Extractor::custom(|def| IconFields {
            view_box: format!("0 0 {} {}", def.width() / 2, def.height() / 2),
            path: def.paths().concat(),
            stroke_width: "1.5".to_string(),
            ..Default::default()
        });
        assert_eq!(
            extractor.encode(&square()).as_str(),
            "SVG;0 0 256 256;M1 1H2V2H1Z;;1.5;"
        );
    }

    #[test]
    fn test_literal_escaping() {
        let fields = IconFields {
            path: r"it's\".to_string(),
            ..Default::default()
        };
        assert_eq!(
            EncodedIcon::from_fields(&fields).to_literal(),
            r"'SVG;;it\'s\\;;;'"
        );
    }

    #[test]
    fn test_strategy_names() {
        for name in Extractor::STRATEGY_NAMES {
            assert!(Extractor::from_name(name).is_some());
        }
        assert!(Extractor::from_name("fancy").is_none());
    }
}
