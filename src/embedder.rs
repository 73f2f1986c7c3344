//! Embedder pipeline: dataset loading, call-site rewriting and import pruning
//!
//! An [`IconEmbedder`] is the build-pipeline hook. `on_init` warms the
//! dataset cache; `transform` rewrites one module:
//!
//! 1. Modules outside the include patterns are returned as [`Transform::Unchanged`]
//! 2. Each configured extractor's call sites are replaced with encoded literals
//! 3. The first import of each dataset and extractor package is removed
//! 4. The result is optionally appended to the dump file
//!
//! The module text is only published once every step has finished, so a
//! transform dropped at an await point never exposes a partial result.

use crate::dataset::{DatasetCache, DatasetLoader, FsDatasetLoader};
use crate::encoder::Extractor;
use crate::error::{Diagnostic, EmbedError, Result};
use crate::options::EmbedOptions;
use crate::pruner::ImportPruner;
use crate::rewriter::CallSiteRewriter;
use crate::types::{BuildPhase, DatasetKey, IconIdentifier, ImportTarget};
use crate::utils::{is_valid_identifier, removed_lines};

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Result of transforming one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transform {
    /// Module not admitted, keep the original text
    Unchanged,
    Code(String),
}

/// Everything that happened while transforming one module
#[derive(Debug, Clone, Default)]
pub struct ModuleReport {
    pub module_id: String,
    pub text: String,
    /// Identifiers whose call sites were replaced
    pub matches: Vec<IconIdentifier>,
    /// Specifiers whose first import was located
    pub resolved_imports: Vec<ImportTarget>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModuleReport {
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::NotFound { identifier } => Some(identifier.as_str()),
            _ => None,
        })
    }
}

/// A configured target with its strategy resolved
#[derive(Debug)]
struct EmbedEntry {
    dataset: DatasetKey,
    extractor_package: String,
    extractor: Extractor,
    rewriter: CallSiteRewriter,
}

/// Append-only file shared by concurrently transformed modules
#[derive(Debug)]
struct DumpSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DumpSink {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Append one complete record; records never interleave
    async fn append(&self, record: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

pub struct IconEmbedder<L = FsDatasetLoader> {
    options: EmbedOptions,
    entries: Vec<EmbedEntry>,
    filter: Option<GlobSet>,
    cache: Arc<DatasetCache>,
    loader: L,
    dump: Option<DumpSink>,
    setup_diagnostics: Vec<Diagnostic>,
}

impl IconEmbedder<FsDatasetLoader> {
    /// Embedder loading datasets from `options.dataset_dir` into the shared cache
    pub fn new(options: EmbedOptions) -> Result<Self> {
        let loader = FsDatasetLoader::new(&options.dataset_dir);
        Self::with_loader(options, loader, DatasetCache::shared())
    }
}

impl<L: DatasetLoader> IconEmbedder<L> {
    pub fn with_loader(options: EmbedOptions, loader: L, cache: Arc<DatasetCache>) -> Result<Self> {
        let mut setup_diagnostics = Vec::new();

        let filter = if options.include.is_empty() {
            log::warn!("{}: `include` option was not provided.", crate::NAME);
            setup_diagnostics.push(Diagnostic::NoIncludePatterns);
            None
        } else {
            Some(build_filter(&options.include)?)
        };

        let mut entries = Vec::new();
        for target in &options.targets {
            let spec = &target.extractor;
            if !is_valid_identifier(&spec.name) {
                return Err(EmbedError::config(format!(
                    "Invalid extractor name '{}'",
                    spec.name
                )));
            }

            let Some(extractor) = spec.strategy.resolve() else {
                log::warn!(
                    "{}: extractor '{}' uses unknown strategy '{}' (expected one of: {}), skipped",
                    crate::NAME,
                    spec.name,
                    spec.strategy.label(),
                    Extractor::STRATEGY_NAMES.join(", ")
                );
                setup_diagnostics.push(Diagnostic::MissingExtractor {
                    name: spec.name.clone(),
                    strategy: spec.strategy.label().to_string(),
                });
                continue;
            };

            entries.push(EmbedEntry {
                dataset: target.dataset.clone(),
                extractor_package: spec.package.clone(),
                extractor,
                rewriter: CallSiteRewriter::new(&spec.name, options.argument_scan)?,
            });
        }

        let dump = options.dump_file.clone().map(DumpSink::new);

        Ok(Self {
            options,
            entries,
            filter,
            cache,
            loader,
            dump,
            setup_diagnostics,
        })
    }

    pub fn options(&self) -> &EmbedOptions {
        &self.options
    }

    /// Warnings raised while resolving the configuration
    pub fn setup_diagnostics(&self) -> &[Diagnostic] {
        &self.setup_diagnostics
    }

    pub fn applies_to(&self, phase: BuildPhase) -> bool {
        self.options.applies_to(phase)
    }

    /// Whether the include patterns admit `module_id`
    pub fn is_included(&self, module_id: &str) -> bool {
        let path = module_id.split(['?', '#']).next().unwrap_or(module_id);
        self.filter
            .as_ref()
            .is_some_and(|filter| filter.is_match(Path::new(path)))
    }

    fn datasets(&self) -> Vec<&DatasetKey> {
        let mut seen = HashSet::new();
        self.entries
            .iter()
            .map(|entry| &entry.dataset)
            .filter(|key| seen.insert(*key))
            .collect()
    }

    /// Load every configured dataset. Must complete before transforms run
    /// for the cache to be warm; transforms still load lazily otherwise.
    pub async fn on_init(&self) -> Result<()> {
        if self.filter.is_none() {
            return Ok(());
        }

        for key in self.datasets() {
            let pack = self.cache.get_or_load(key, &self.loader).await?;
            log::debug!("Dataset {} ready ({} icons)", key, pack.len());
        }

        Ok(())
    }

    pub async fn transform(&self, code: &str, module_id: &str) -> Result<Transform> {
        Ok(match self.transform_with_report(code, module_id).await? {
            Some(report) => Transform::Code(report.text),
            None => Transform::Unchanged,
        })
    }

    /// Transform one module, returning `None` when it is not admitted
    pub async fn transform_with_report(
        &self,
        code: &str,
        module_id: &str,
    ) -> Result<Option<ModuleReport>> {
        if !self.is_included(module_id) {
            return Ok(None);
        }

        log::debug!("Transforming {}", module_id);

        let mut report = ModuleReport {
            module_id: module_id.to_string(),
            text: code.to_string(),
            ..Default::default()
        };

        let mut skipped: Vec<&EmbedEntry> = Vec::new();
        for entry in &self.entries {
            let pack = match self.cache.get_or_load(&entry.dataset, &self.loader).await {
                Ok(pack) => pack,
                Err(e) => {
                    log::warn!("{}: skipping {} in {}: {}", crate::NAME, entry.dataset, module_id, e);
                    report.diagnostics.push(Diagnostic::DatasetUnavailable {
                        dataset: entry.dataset.to_string(),
                        message: e.to_string(),
                    });
                    skipped.push(entry);
                    continue;
                }
            };

            let output = entry.rewriter.rewrite(&report.text, |identifier| {
                pack.get(identifier)
                    .map(|definition| entry.extractor.encode(definition))
            });
            report.text = output.text;
            report.matches.extend(output.matches);
            report.diagnostics.extend(output.diagnostics);
        }

        if self.options.remove_imports {
            self.prune_imports(&mut report, &skipped);
        }

        self.log_report(&report);

        if let Some(dump) = &self.dump {
            dump.append(&self.dump_record(&report)).await?;
        }

        Ok(Some(report))
    }

    /// Prune each entry's dataset and extractor packages, skipping
    /// specifiers already handled for this module. Specifiers of `skipped`
    /// entries are never pruned, since their call sites were not rewritten.
    fn prune_imports(&self, report: &mut ModuleReport, skipped: &[&EmbedEntry]) {
        let pruner = ImportPruner::for_module(&report.module_id);
        let mut attempted: HashSet<&str> = skipped
            .iter()
            .copied()
            .flat_map(|entry| [entry.dataset.package.as_str(), entry.extractor_package.as_str()])
            .collect();

        for entry in &self.entries {
            let mut targets: Vec<&str> = Vec::with_capacity(2);
            for specifier in [entry.dataset.package.as_str(), entry.extractor_package.as_str()] {
                if attempted.insert(specifier) {
                    targets.push(specifier);
                }
            }
            if targets.is_empty() {
                continue;
            }

            let pruned = pruner.prune_with_report(&report.text, &targets);
            if pruned.parse_failed {
                log::debug!("{} could not be parsed, imports left in place", report.module_id);
                report.diagnostics.push(Diagnostic::ParseFailure {
                    module_id: report.module_id.clone(),
                });
                break;
            }

            if self.options.show_replacements {
                let removed = removed_lines(&report.text, &pruned.text);
                if !removed.is_empty() {
                    log::info!("Removed imports:\n{}", removed.trim_end());
                }
            }

            report.resolved_imports.extend(pruned.resolved);
            report.text = pruned.text;
        }
    }

    fn log_report(&self, report: &ModuleReport) {
        if self.options.show_replacements {
            log::info!("{}: {}", crate::NAME, report.module_id);
            for diagnostic in &report.diagnostics {
                match diagnostic {
                    Diagnostic::Replaced { .. } => log::info!("{}", diagnostic),
                    _ => log::warn!("{}", diagnostic),
                }
            }
        } else {
            log::debug!(
                "{}: {} replaced, {} unresolved, {} imports pruned",
                report.module_id,
                report.matches.len(),
                report.unresolved().count(),
                report.resolved_imports.len()
            );
        }
    }

    fn dump_record(&self, report: &ModuleReport) -> String {
        let mut record = format!("\n// File: {}\n", report.module_id);
        if self.options.show_replacements {
            for diagnostic in &report.diagnostics {
                record.push_str("//");
                record.push_str(&diagnostic.to_string());
                record.push('\n');
            }
        }
        record.push_str(&report.text);
        record
    }
}

fn build_filter(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| EmbedError::pattern(pattern, e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| EmbedError::pattern(patterns.join(", "), e.to_string()))
}
