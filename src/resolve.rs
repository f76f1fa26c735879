//! Pattern resolution
//!
//! Turns one frontier pattern into the directory entries it matches.
//! Ignore rules are applied here, so excluded entries never become
//! candidates and are never expanded.

use crate::exclude::{load_gitignore, GitignoreStack, IgnoreSet};
use crate::frontier::{DirPattern, EntryKind, SampledEntry};
use async_trait::async_trait;
use glob::MatchOptions;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A matched entry plus, for directories, its symlink-resolved path
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub entry: SampledEntry,
    pub canonical: Option<PathBuf>,
}

/// Everything one pattern expanded to
#[derive(Debug, Clone)]
pub struct Resolution {
    pub entries: Vec<ResolvedEntry>,
    /// Matchers in force for the children of the resolved directory
    pub gitignores: GitignoreStack,
    /// False when the level could not be read at all; the walk is then
    /// missing an unknown part of the tree
    pub complete: bool,
}

impl Resolution {
    pub fn new(entries: Vec<ResolvedEntry>) -> Self {
        Self {
            entries,
            gitignores: GitignoreStack::default(),
            complete: true,
        }
    }

    /// A level that failed to resolve
    pub fn failed() -> Self {
        Self {
            entries: Vec::new(),
            gitignores: GitignoreStack::default(),
            complete: false,
        }
    }

    pub fn with_gitignores(mut self, gitignores: GitignoreStack) -> Self {
        self.gitignores = gitignores;
        self
    }
}

/// Expands a directory pattern into its matching entries
#[async_trait]
pub trait PatternResolver: Send + Sync {
    /// Entries matching `pattern`, in the order they should be sampled.
    /// Unreadable directories and bad patterns resolve to an empty,
    /// complete list; only an internal failure marks it incomplete.
    async fn resolve(&self, pattern: &DirPattern, root: &Path, ignore: Arc<IgnoreSet>)
        -> Resolution;
}

/// Resolver backed by the `glob` crate
#[derive(Debug, Clone)]
pub struct GlobResolver {
    pub follow_symlinks: bool,
}

impl Default for GlobResolver {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
        }
    }
}

#[async_trait]
impl PatternResolver for GlobResolver {
    async fn resolve(
        &self,
        pattern: &DirPattern,
        root: &Path,
        ignore: Arc<IgnoreSet>,
    ) -> Resolution {
        let pattern = pattern.clone();
        let root = root.to_path_buf();
        let follow = self.follow_symlinks;
        let dir = pattern.dir.clone();

        run_blocking(move || expand(&pattern, &root, &ignore, follow))
            .await
            .unwrap_or_else(|| {
                warn!("Resolving {} failed; sample will be marked truncated", dir.display());
                Resolution::failed()
            })
    }
}

/// Run blocking filesystem work off the runtime; None if the task died
pub async fn run_blocking<T, F>(work: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Blocking task failed: {}", e);
            None
        }
    }
}

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn expand(pattern: &DirPattern, root: &Path, ignore: &IgnoreSet, follow_symlinks: bool) -> Resolution {
    let gitignores = match ignore
        .uses_gitignore()
        .then(|| load_gitignore(&pattern.dir))
        .flatten()
    {
        Some(gi) => pattern.gitignores.push(gi),
        None => pattern.gitignores.clone(),
    };

    let glob = pattern.glob();
    let paths = match glob::glob_with(&glob, GLOB_OPTIONS) {
        Ok(paths) => paths,
        Err(e) => {
            debug!("Bad glob '{}': {}", glob, e);
            return Resolution::new(Vec::new()).with_gitignores(gitignores);
        }
    };

    let depth = pattern.child_depth();
    let mut out = Vec::new();
    for item in paths {
        let path = match item {
            Ok(path) => path,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let Ok(meta) = fs::symlink_metadata(&path) else {
            continue;
        };
        let is_dir = if meta.file_type().is_symlink() {
            follow_symlinks && path.is_dir()
        } else {
            meta.is_dir()
        };

        if ignore.is_excluded(&path, root) || gitignores.is_ignored(&path, is_dir) {
            continue;
        }

        let canonical = if is_dir { path.canonicalize().ok() } else { None };
        out.push(ResolvedEntry {
            entry: SampledEntry {
                path,
                kind: if is_dir { EntryKind::Dir } else { EntryKind::File },
                depth,
            },
            canonical,
        });
    }
    Resolution::new(out).with_gitignores(gitignores)
}
