// FILE: src/cli/handlers.rs
use crate::{
    cli::OutputFormat,
    dataset::{DatasetCache, FsDatasetLoader},
    types::{BuildPhase, DatasetKey},
    EmbedError, Extractor, IconEmbedder, ModuleReport, Result,
};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// Files to process: the input itself, or every included file below it
fn collect_inputs(input_path: &str, recursive: bool, embedder: &IconEmbedder) -> Result<Vec<PathBuf>> {
    let path = Path::new(input_path);
    if !path.exists() {
        return Err(EmbedError::FileNotFound {
            path: input_path.to_string(),
        });
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !recursive {
        return Err(EmbedError::InvalidFormat {
            message: format!("'{}' is a directory, use --recursive", input_path),
        });
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path) {
        let entry = entry.map_err(|e| {
            EmbedError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Directory traversal error: {}", e),
            ))
        })?;
        if entry.file_type().is_file() && embedder.is_included(&entry.path().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Transform every file concurrently, returning reports in input order
async fn transform_all(
    embedder: Arc<IconEmbedder>,
    files: Vec<PathBuf>,
) -> Result<Vec<(PathBuf, Option<ModuleReport>)>> {
    embedder.on_init().await?;

    let mut tasks = JoinSet::new();
    for (index, file) in files.into_iter().enumerate() {
        let embedder = Arc::clone(&embedder);
        tasks.spawn(async move {
            let code = tokio::fs::read_to_string(&file).await?;
            let module_id = file.to_string_lossy().into_owned();
            let report = embedder.transform_with_report(&code, &module_id).await?;
            Ok::<_, EmbedError>((index, file, report))
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.map_err(|e| {
            EmbedError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
        })??;
        results.push(outcome);
    }
    results.sort_by_key(|(index, _, _)| *index);

    Ok(results
        .into_iter()
        .map(|(_, file, report)| (file, report))
        .collect())
}

// --- TRANSFORM ---
pub fn handle_transform_command(cli: &super::EmbedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches.get_one::<String>("input").map(String::as_str).unwrap_or_default();
    let output_dir = matches.get_one::<String>("output").map(PathBuf::from);
    let in_place = matches.get_flag("in-place");
    let phase = matches.get_one::<BuildPhase>("phase").copied().unwrap_or(BuildPhase::Build);

    let options = cli.build_embed_options(matches);
    if !options.applies_to(phase) {
        println!("Embedding is restricted to another build phase, nothing to do.");
        return Ok(());
    }

    let embedder = Arc::new(IconEmbedder::new(options)?);
    let files = collect_inputs(input_path, matches.get_flag("recursive"), &embedder)?;
    if files.len() > 1 && output_dir.is_none() && !in_place {
        return Err(EmbedError::InvalidFormat {
            message: "Transforming several files requires --output or --in-place".to_string(),
        });
    }

    let start = Instant::now();
    let results = runtime()?.block_on(transform_all(embedder, files))?;

    let mut replaced = 0;
    let mut unresolved = 0;
    for (file, report) in &results {
        let Some(report) = report else {
            log::warn!("{} not matched by include patterns, skipped", file.display());
            continue;
        };
        replaced += report.matches.len();
        unresolved += report.unresolved().count();

        if in_place {
            std::fs::write(file, &report.text)?;
        } else if let Some(dir) = &output_dir {
            let relative = file
                .strip_prefix(input_path)
                .ok()
                .filter(|relative| !relative.as_os_str().is_empty())
                .or_else(|| file.file_name().map(Path::new))
                .unwrap_or(file);
            let target = dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, &report.text)?;
        } else {
            print!("{}", report.text);
        }
    }

    if in_place || output_dir.is_some() {
        println!("✅ Embedded {} icons in {} modules", replaced, results.len());
        if unresolved > 0 {
            println!("   ⚠️  {} icons not found", unresolved);
        }
        println!("   Time: {}ms", start.elapsed().as_millis());
    }

    Ok(())
}

// --- CHECK ---
#[derive(Debug, Serialize)]
struct CheckSummary {
    module: String,
    replaced: Vec<String>,
    unresolved: Vec<String>,
    imports: Vec<String>,
    notes: Vec<String>,
}

impl From<&ModuleReport> for CheckSummary {
    fn from(report: &ModuleReport) -> Self {
        Self {
            module: report.module_id.clone(),
            replaced: report.matches.clone(),
            unresolved: report.unresolved().map(str::to_string).collect(),
            imports: report.resolved_imports.clone(),
            notes: report
                .diagnostics
                .iter()
                .filter(|d| {
                    !matches!(
                        d,
                        crate::Diagnostic::Replaced { .. } | crate::Diagnostic::NotFound { .. }
                    )
                })
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

pub fn handle_check_command(cli: &super::EmbedCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches.get_one::<String>("input").map(String::as_str).unwrap_or_default();
    let format = matches.get_one::<OutputFormat>("format").cloned().unwrap_or(OutputFormat::Text);

    let mut options = cli.build_embed_options(matches);
    options.dump_file = None;
    let embedder = Arc::new(IconEmbedder::new(options)?);
    let files = collect_inputs(input_path, matches.get_flag("recursive"), &embedder)?;

    let results = runtime()?.block_on(transform_all(embedder, files))?;
    let summaries: Vec<CheckSummary> = results
        .iter()
        .filter_map(|(_, report)| report.as_ref().map(CheckSummary::from))
        .collect();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&summaries).map_err(|e| EmbedError::InvalidFormat {
                message: format!("JSON serialization error: {}", e),
            })?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            for summary in &summaries {
                println!("🔍 {}", summary.module);
                println!("   Replaced: {}", summary.replaced.join(", "));
                if !summary.unresolved.is_empty() {
                    println!("   ❌ Not found: {}", summary.unresolved.join(", "));
                }
                println!("   Imports removed: {}", summary.imports.join(", "));
                for note in &summary.notes {
                    println!("   ⚠️  {}", note);
                }
            }
            println!("\n📊 Check Summary:");
            println!("   Modules: {}", summaries.len());
            println!(
                "   Unresolved icons: {}",
                summaries.iter().map(|s| s.unresolved.len()).sum::<usize>()
            );
        }
    }

    if summaries.iter().any(|s| !s.unresolved.is_empty()) {
        Err(EmbedError::config("some icons could not be resolved"))
    } else {
        Ok(())
    }
}

// --- ENCODE ---
pub fn handle_encode_command(cli: &super::EmbedCli, matches: &clap::ArgMatches) -> Result<()> {
    let identifier = matches.get_one::<String>("identifier").map(String::as_str).unwrap_or_default();
    let options = cli.build_embed_options(matches);
    let target = options.targets.first().cloned().unwrap_or_default();

    let key = DatasetKey::new(
        matches.get_one::<String>("package").cloned().unwrap_or(target.dataset.package),
        matches.get_one::<String>("binding").cloned().unwrap_or(target.dataset.binding),
    );
    let extractor = match matches.get_one::<String>("strategy") {
        Some(name) => Extractor::from_name(name).ok_or_else(|| {
            EmbedError::config(format!(
                "Unknown strategy '{}' (expected one of: {})",
                name,
                Extractor::STRATEGY_NAMES.join(", ")
            ))
        })?,
        None => target.extractor.strategy.resolve().unwrap_or_default(),
    };

    let loader = FsDatasetLoader::new(&options.dataset_dir);
    let cache = DatasetCache::new();
    let pack = runtime()?.block_on(cache.get_or_load(&key, &loader))?;

    let definition = pack
        .get(crate::rewriter::icon_identifier(identifier))
        .ok_or_else(|| EmbedError::dataset(&key.package, format!("icon '{}' not found", identifier)))?;

    println!("{}", extractor.encode(definition).to_literal());
    Ok(())
}
