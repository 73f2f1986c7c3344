// FILE: src/cli/mod.rs

mod config;
mod handlers;

pub use config::{ConfigFile, ExtractorConfig, TargetConfig};

use crate::error::Result;
use crate::options::EmbedOptions;
use crate::rewriter::ArgumentScan;
use crate::types::BuildPhase;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::path::PathBuf;

/// Include patterns used by the CLI when neither flags nor config set any
pub const DEFAULT_CLI_INCLUDE: &[&str] = &["**/*.js", "**/*.mjs", "**/*.jsx", "**/*.ts", "**/*.mts", "**/*.tsx"];

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct EmbedCli {
    config: ConfigFile,
}

impl Default for EmbedCli {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbedCli {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        let matches = self.build_cli().get_matches();

        self.setup_logging(matches.get_count("verbose"));

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        match matches.subcommand() {
            Some(("transform", sub_matches)) => handlers::handle_transform_command(self, sub_matches),
            Some(("check", sub_matches)) => handlers::handle_check_command(self, sub_matches),
            Some(("encode", sub_matches)) => handlers::handle_encode_command(self, sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        }
    }

    fn build_cli(&self) -> Command {
        let include = Arg::new("include")
            .short('I')
            .long("include")
            .value_name("GLOB")
            .help("Only transform modules matching this pattern")
            .action(ArgAction::Append);
        let datasets = Arg::new("datasets")
            .long("datasets")
            .value_name("DIR")
            .help("Directory holding <package>.json icon datasets");
        let recursive = Arg::new("recursive")
            .short('r')
            .long("recursive")
            .help("Process every matching file below a directory")
            .action(ArgAction::SetTrue);

        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .global(true)
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .global(true)
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("transform")
                    .about("Embed icons into modules and prune their imports")
                    .arg(Arg::new("input").help("Input module or directory").required(true).index(1))
                    .arg(Arg::new("output").short('o').long("output").value_name("DIR").help("Write transformed modules below this directory"))
                    .arg(Arg::new("in-place").long("in-place").help("Overwrite input modules").action(ArgAction::SetTrue).conflicts_with("output"))
                    .arg(recursive.clone())
                    .arg(include.clone())
                    .arg(datasets.clone())
                    .arg(Arg::new("phase").long("phase").value_parser(clap::value_parser!(BuildPhase)).default_value("build").help("Build phase being run"))
                    .arg(Arg::new("scan").long("scan").value_parser(clap::value_parser!(ArgumentScan)).help("How extractor call arguments are delimited"))
                    .arg(Arg::new("keep-imports").long("keep-imports").help("Do not remove dataset and extractor imports").action(ArgAction::SetTrue))
                    .arg(Arg::new("show-replacements").short('s').long("show-replacements").help("Log every replacement and removed import").action(ArgAction::SetTrue))
                    .arg(Arg::new("dump").long("dump").value_name("FILE").help("Append transformed modules to this file")),
            )
            .subcommand(
                Command::new("check")
                    .about("Report resolved and unresolved icons without writing anything")
                    .arg(Arg::new("input").help("Input module or directory").required(true).index(1))
                    .arg(recursive)
                    .arg(include)
                    .arg(datasets.clone())
                    .arg(Arg::new("format").short('f').long("format").value_parser(clap::value_parser!(OutputFormat)).default_value("text").help("Report format")),
            )
            .subcommand(
                Command::new("encode")
                    .about("Print the encoded literal for one icon")
                    .arg(Arg::new("identifier").help("Icon identifier, e.g. faAt").required(true).index(1))
                    .arg(Arg::new("package").short('p').long("package").value_name("PACKAGE").help("Dataset package"))
                    .arg(Arg::new("binding").short('b').long("binding").value_name("NAME").help("Exported binding of the dataset package"))
                    .arg(Arg::new("strategy").long("strategy").value_name("NAME").help("Encoder strategy (standard, path-only)"))
                    .arg(datasets),
            )
    }

    fn setup_logging(&self, verbose_count: u8) {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
    }

    /// Options from the config file, overridden by command-line flags
    pub fn build_embed_options(&self, matches: &clap::ArgMatches) -> EmbedOptions {
        let mut options = self.config.to_options();

        if let Some(patterns) = matches.try_get_many::<String>("include").ok().flatten() {
            options.include = patterns.cloned().collect();
        }
        if options.include.is_empty() {
            options.include = DEFAULT_CLI_INCLUDE.iter().map(|p| p.to_string()).collect();
        }
        if let Some(dir) = matches.try_get_one::<String>("datasets").ok().flatten() {
            options.dataset_dir = PathBuf::from(dir);
        }
        if let Some(scan) = matches.try_get_one::<ArgumentScan>("scan").ok().flatten() {
            options.argument_scan = *scan;
        }
        if matches.try_get_one::<bool>("keep-imports").ok().flatten() == Some(&true) {
            options.remove_imports = false;
        }
        if matches.try_get_one::<bool>("show-replacements").ok().flatten() == Some(&true) {
            options.show_replacements = true;
        }
        if let Some(dump) = matches.try_get_one::<String>("dump").ok().flatten() {
            options.dump_file = Some(PathBuf::from(dump));
        }

        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_for(args: &[&str]) -> EmbedOptions {
        let cli = EmbedCli::new();
        let matches = cli.build_cli().try_get_matches_from(args).unwrap();
        let (_, sub_matches) = matches.subcommand().unwrap();
        cli.build_embed_options(sub_matches)
    }

    #[test]
    fn test_cli_definition() {
        EmbedCli::new().build_cli().debug_assert();
    }

    #[test]
    fn test_transform_flags() {
        let options = options_for(&[
            "svgembed",
            "transform",
            "src",
            "-I",
            "src/**/icons.ts",
            "--keep-imports",
            "--scan",
            "non-whitespace",
            "--datasets",
            "vendor",
            "--dump",
            "dump.js",
        ]);
        assert_eq!(options.include, vec!["src/**/icons.ts"]);
        assert!(!options.remove_imports);
        assert_eq!(options.argument_scan, ArgumentScan::NonWhitespace);
        assert_eq!(options.dataset_dir, PathBuf::from("vendor"));
        assert_eq!(options.dump_file, Some(PathBuf::from("dump.js")));
    }

    #[test]
    fn test_default_include_for_cli() {
        let options = options_for(&["svgembed", "check", "src"]);
        assert_eq!(options.include.len(), DEFAULT_CLI_INCLUDE.len());
        assert!(options.remove_imports);
    }
}
