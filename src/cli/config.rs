// FILE: src/cli/config.rs

use crate::error::{EmbedError, Result};
use crate::options::{EmbedOptions, EmbedTarget, ExtractorSpec, ExtractorStrategy};
use crate::rewriter::ArgumentScan;
use crate::types::{BuildPhase, DatasetKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub include: Option<Vec<String>>,
    pub remove_imports: Option<bool>,
    pub show_replacements: Option<bool>,
    pub dump_file: Option<String>,
    pub apply: Option<BuildPhase>,
    pub argument_scan: Option<ArgumentScan>,
    pub dataset_dir: Option<String>,
    pub targets: Option<Vec<TargetConfig>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Dataset package
    pub package: Option<String>,
    /// Exported binding of the dataset package
    pub binding: Option<String>,
    pub extractor: Option<ExtractorConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractorConfig {
    pub name: Option<String>,
    pub package: Option<String>,
    pub strategy: Option<String>,
}

impl TargetConfig {
    fn into_target(self) -> EmbedTarget {
        let defaults = EmbedTarget::default();
        let extractor = self.extractor.unwrap_or_default();

        EmbedTarget {
            dataset: DatasetKey {
                package: self.package.unwrap_or(defaults.dataset.package),
                binding: self.binding.unwrap_or(defaults.dataset.binding),
            },
            extractor: ExtractorSpec {
                name: extractor.name.unwrap_or(defaults.extractor.name),
                package: extractor.package.unwrap_or(defaults.extractor.package),
                strategy: extractor
                    .strategy
                    .map(ExtractorStrategy::Named)
                    .unwrap_or(defaults.extractor.strategy),
            },
        }
    }
}

impl ConfigFile {
    /// Options with every unset field at its default
    pub fn to_options(&self) -> EmbedOptions {
        let mut options = EmbedOptions::default();

        if let Some(include) = &self.include {
            options.include = include.clone();
        }
        if let Some(remove_imports) = self.remove_imports {
            options.remove_imports = remove_imports;
        }
        if let Some(show_replacements) = self.show_replacements {
            options.show_replacements = show_replacements;
        }
        if let Some(dump_file) = &self.dump_file {
            options.dump_file = Some(PathBuf::from(dump_file));
        }
        options.apply = self.apply;
        if let Some(scan) = self.argument_scan {
            options.argument_scan = scan;
        }
        if let Some(dir) = &self.dataset_dir {
            options.dataset_dir = PathBuf::from(dir);
        }
        if let Some(targets) = &self.targets {
            options.targets = targets.iter().cloned().map(TargetConfig::into_target).collect();
        }

        options
    }
}

pub fn load(config_path: &str) -> Result<ConfigFile> {
    log::info!("Loaded configuration from {}", config_path);
    let config_content = fs::read_to_string(config_path).map_err(|e| {
        EmbedError::FileNotFound {
            path: format!("Config file {}: {}", config_path, e),
        }
    })?;

    parse(config_path, &config_content)
}

fn parse(config_path: &str, config_content: &str) -> Result<ConfigFile> {
    if config_path.ends_with(".json") {
        serde_json::from_str(config_content).map_err(|e| EmbedError::InvalidFormat {
            message: format!("Invalid JSON config: {}", e),
        })
    } else if config_path.ends_with(".toml") {
        toml::from_str(config_content).map_err(|e| EmbedError::InvalidFormat {
            message: format!("Invalid TOML config: {}", e),
        })
    } else {
        Err(EmbedError::InvalidFormat {
            message: "Config file must be .json or .toml format".to_string(),
        })
    }
}
