//! treesample - bounded workspace sampling for code assistants
//!
//! Lists a project's files for inclusion in a prompt without getting stuck
//! on huge monorepos, dependency caches or symlink loops:
//!
//! - Breadth-first, so a tight limit still covers the top of the tree
//! - Hard result limit and wall-clock budget; partial results on timeout
//! - Glob-style ignore rules plus `.gitignore` files at any depth
//!
//! ```no_run
//! # async fn demo() -> treesample::Result<()> {
//! use treesample::{list_files, SamplerConfig};
//!
//! let config = SamplerConfig::default();
//! let listing = list_files("src".as_ref(), true, 200, &config).await?;
//! println!("{}", listing.render());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exclude;
pub mod frontier;
pub mod listing;
pub mod resolve;
pub mod sampler;

pub use config::SamplerConfig;
pub use error::{Result, SampleError};
pub use exclude::{load_gitignore, GitignoreStack, IgnoreSet, DEFAULT_IGNORES};
pub use frontier::{EntryKind, SampledEntry};
pub use listing::{list_files, list_workspace, Listing};
pub use resolve::{GlobResolver, PatternResolver, Resolution, ResolvedEntry};
pub use sampler::{sample, Outcome, SampleRequest, TreeSampler};
