//! SVG Icon Embedder
//!
//! Replaces runtime lookups into a large icon dataset with string literals
//! inlined into JavaScript and TypeScript modules at build time.
//!
//! # Features
//!
//! - Call-site rewriting: `faIconToString(faAt)` becomes `'SVG;0 0 512 512;M...;;;'`
//! - Import pruning of the dataset and extractor packages, AST based and
//!   byte-preserving outside the removed spans
//! - Static `import` declarations and `await import()` bound by `const`/`let`
//! - Built-in encoder strategies plus user-supplied field builders
//! - Datasets loaded once per process, shared by concurrent transforms
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use svgembed::{EmbedOptions, IconEmbedder, Result, Transform};
//!
//! # async fn run() -> Result<()> {
//! let embedder = IconEmbedder::new(EmbedOptions::default().with_include("**/icons.ts"))?;
//! embedder.on_init().await?;
//!
//! let code = std::fs::read_to_string("src/icons.ts")?;
//! if let Transform::Code(embedded) = embedder.transform(&code, "src/icons.ts").await? {
//!     std::fs::write("src/icons.ts", embedded)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Encoded Format
//!
//! `SVG;<view box>;<path data>;<fill>;<stroke width>;<fill rule>`, see
//! [`encoder`] for the field contract.

pub mod types;
pub mod error;
pub mod utils;
pub mod encoder;
pub mod rewriter;
pub mod pruner;
pub mod dataset;
pub mod options;
pub mod embedder;
pub mod cli;

// Re-export commonly used types and functions
pub use error::{Diagnostic, EmbedError, Result};
pub use types::*;
pub use encoder::{encode, EncodedIcon, Extractor, IconFields};
pub use rewriter::{ArgumentScan, CallSiteRewriter, RewriteOutput};
pub use pruner::{prune, splice, ImportPruner, PruneReport};
pub use dataset::{DatasetCache, DatasetLoader, FsDatasetLoader};
pub use options::{EmbedOptions, EmbedTarget, ExtractorSpec, ExtractorStrategy};
pub use embedder::{IconEmbedder, ModuleReport, Transform};
pub use cli::EmbedCli;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
