//! Core types and constants for the icon embedder

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// Encoded icon format constants
pub const ENCODED_TAG: &str = "SVG";
pub const ENCODED_SEPARATOR: char = ';';
pub const ENCODED_FIELD_COUNT: usize = 6;

// Default configuration values
pub const DEFAULT_DATASET_PACKAGE: &str = "@fortawesome/free-solid-svg-icons";
pub const DEFAULT_DATASET_BINDING: &str = "fas";
pub const DEFAULT_EXTRACTOR_NAME: &str = "faIconToString";
pub const DEFAULT_EXTRACTOR_PACKAGE: &str = "@xrnoz/vuetify-svg-icons";
pub const DEFAULT_DATASET_DIR: &str = "icons";

/// Key into an icon dataset
pub type IconIdentifier = String;

/// Module specifier whose first import is a removal candidate
pub type ImportTarget = String;

/// Mapping from identifier to icon definition for one exported binding
pub type IconPack = HashMap<IconIdentifier, IconDefinition>;

/// Path data of an icon: a single path or several layered ones
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathData {
    Single(String),
    Multiple(Vec<String>),
}

impl PathData {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            PathData::Single(path) => vec![path.as_str()],
            PathData::Multiple(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

/// Icon-font style tuple: `[width, height, ligatures, unicode, path data]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconData(
    pub u32,
    pub u32,
    pub Vec<String>,
    pub String,
    pub PathData,
);

/// Structured icon record as supplied by a dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,

    pub icon: IconData,

    /// Overrides the implicit `0 0 width height` view box
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_box: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_rule: Option<String>,
}

impl IconDefinition {
    pub fn new(width: u32, height: u32, path: impl Into<String>) -> Self {
        Self {
            prefix: None,
            icon_name: None,
            icon: IconData(width, height, Vec::new(), String::new(), PathData::Single(path.into())),
            view_box: None,
            fill: None,
            stroke_width: None,
            fill_rule: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.icon.0
    }

    pub fn height(&self) -> u32 {
        self.icon.1
    }

    pub fn paths(&self) -> Vec<&str> {
        self.icon.4.paths()
    }
}

/// Half-open byte range `[start, end)` over module text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Identifies one exported binding of a dataset package
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    pub package: String,
    pub binding: String,
}

impl DatasetKey {
    pub fn new(package: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            binding: binding.into(),
        }
    }
}

impl Default for DatasetKey {
    fn default() -> Self {
        Self::new(DEFAULT_DATASET_PACKAGE, DEFAULT_DATASET_BINDING)
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.package, self.binding)
    }
}

/// Build phase a plugin instance can be restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    Build,
    Serve,
}
