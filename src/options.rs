//! Embedder options and configured targets

use crate::encoder::Extractor;
use crate::rewriter::ArgumentScan;
use crate::types::{
    BuildPhase, DatasetKey, DEFAULT_DATASET_DIR, DEFAULT_EXTRACTOR_NAME, DEFAULT_EXTRACTOR_PACKAGE,
};
use std::path::PathBuf;

/// Which encoder strategy an extractor uses
#[derive(Debug, Clone)]
pub enum ExtractorStrategy {
    /// Built-in strategy looked up by name, see [`Extractor::from_name`]
    Named(String),
    /// Strategy supplied directly, including [`Extractor::Custom`]
    Function(Extractor),
}

impl ExtractorStrategy {
    pub fn resolve(&self) -> Option<Extractor> {
        match self {
            ExtractorStrategy::Named(name) => Extractor::from_name(name),
            ExtractorStrategy::Function(extractor) => Some(extractor.clone()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ExtractorStrategy::Named(name) => name,
            ExtractorStrategy::Function(_) => "<function>",
        }
    }
}

impl Default for ExtractorStrategy {
    fn default() -> Self {
        Self::Named("standard".to_string())
    }
}

/// The function whose call sites are replaced
#[derive(Debug, Clone)]
pub struct ExtractorSpec {
    /// Name of the function in module source
    pub name: String,
    /// Package the function is imported from
    pub package: String,
    pub strategy: ExtractorStrategy,
}

impl Default for ExtractorSpec {
    fn default() -> Self {
        Self {
            name: DEFAULT_EXTRACTOR_NAME.to_string(),
            package: DEFAULT_EXTRACTOR_PACKAGE.to_string(),
            strategy: ExtractorStrategy::default(),
        }
    }
}

/// One dataset paired with the extractor that embeds its icons
#[derive(Debug, Clone, Default)]
pub struct EmbedTarget {
    pub dataset: DatasetKey,
    pub extractor: ExtractorSpec,
}

/// Embedding options and settings
#[derive(Debug, Clone)]
pub struct EmbedOptions {
    /// Glob patterns selecting the modules to transform
    pub include: Vec<String>,

    pub targets: Vec<EmbedTarget>,

    /// Remove the first import of each dataset and extractor package
    pub remove_imports: bool,

    /// Log every replacement and removed import
    pub show_replacements: bool,

    /// File the transformed modules are appended to
    pub dump_file: Option<PathBuf>,

    /// Restrict the embedder to one build phase
    pub apply: Option<BuildPhase>,

    pub argument_scan: ArgumentScan,

    /// Directory datasets are loaded from
    pub dataset_dir: PathBuf,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            targets: vec![EmbedTarget::default()],
            remove_imports: true,
            show_replacements: false,
            dump_file: None,
            apply: None,
            argument_scan: ArgumentScan::default(),
            dataset_dir: PathBuf::from(DEFAULT_DATASET_DIR),
        }
    }
}

impl EmbedOptions {
    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn applies_to(&self, phase: BuildPhase) -> bool {
        self.apply.map_or(true, |apply| apply == phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EmbedOptions::default();
        assert!(options.include.is_empty());
        assert!(options.remove_imports);
        assert!(!options.show_replacements);
        assert_eq!(options.targets.len(), 1);
        assert_eq!(options.targets[0].extractor.name, "faIconToString");
        assert_eq!(options.targets[0].dataset.binding, "fas");
    }

    #[test]
    fn test_applies_to() {
        let mut options = EmbedOptions::default();
        assert!(options.applies_to(BuildPhase::Build));
        assert!(options.applies_to(BuildPhase::Serve));

        options.apply = Some(BuildPhase::Build);
        assert!(options.applies_to(BuildPhase::Build));
        assert!(!options.applies_to(BuildPhase::Serve));
    }

    #[test]
    fn test_strategy_resolution() {
        assert!(ExtractorStrategy::default().resolve().is_some());
        assert!(ExtractorStrategy::Named("unknown".into()).resolve().is_none());
        assert!(ExtractorStrategy::Function(Extractor::PathOnly).resolve().is_some());
    }
}
