//! Workspace file listing for assistant context
//!
//! Wraps the sampler with the policy the prompt layer expects:
//! - never walk the filesystem root or the home directory
//! - recursive listings skip build/dependency dirs, dot entries and
//!   whatever the `.gitignore` files along the way name
//! - single-level listings show everything, so the assistant at least
//!   knows hidden and build directories exist

use crate::config::SamplerConfig;
use crate::error::{Result, SampleError};
use crate::exclude::IgnoreSet;
use crate::frontier::{EntryKind, SampledEntry};
use crate::sampler::{SampleRequest, TreeSampler};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

pub const TRUNCATION_NOTICE: &str =
    "(File list truncated. More files may exist; list a specific subdirectory to see them.)";

/// A file listing ready to embed in a prompt
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    /// Absolute directory that was listed
    pub root: PathBuf,
    pub entries: Vec<SampledEntry>,
    pub truncated: bool,
    /// Root or home directory; only the path itself is reported
    pub refused: bool,
}

impl Listing {
    fn refused(root: PathBuf) -> Self {
        Self {
            entries: vec![SampledEntry {
                path: root.clone(),
                kind: EntryKind::Dir,
                depth: 0,
            }],
            root,
            truncated: false,
            refused: true,
        }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    /// One path per line relative to the root, directories end in `/`.
    /// Truncated listings end with a notice so nobody reads them as complete.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No files found.".to_string();
        }

        let mut out = String::new();
        for entry in &self.entries {
            let line = if self.refused {
                entry.path.display().to_string()
            } else {
                display_relative(&entry.path, &self.root)
            };
            out.push_str(&line);
            if entry.is_dir() && !line.ends_with('/') {
                out.push('/');
            }
            out.push('\n');
        }

        if self.truncated {
            out.push('\n');
            out.push_str(TRUNCATION_NOTICE);
        } else {
            out.pop();
        }
        out
    }
}

/// List files under `dir` with the configured default limit
pub async fn list_workspace(dir: &Path, recursive: bool, config: &SamplerConfig) -> Result<Listing> {
    list_files(dir, recursive, config.default_limit, config).await
}

/// List files under `dir` for the assistant
pub async fn list_files(
    dir: &Path,
    recursive: bool,
    limit: usize,
    config: &SamplerConfig,
) -> Result<Listing> {
    // `a//b/` and `a/b` must produce the same root for matching and display
    let root: PathBuf = absolutize(dir)?.components().collect();

    if is_filesystem_root(&root) || is_home_dir(&root) {
        info!("Refusing to list {}", root.display());
        return Ok(Listing::refused(root));
    }

    let ignore = if recursive {
        let set = config.ignore_set();
        if config.respect_gitignore {
            set.with_gitignore()
        } else {
            set
        }
    } else {
        IgnoreSet::empty()
    };

    let request = SampleRequest::new(&root, recursive, limit).ignoring(ignore);
    let outcome = TreeSampler::new(config).sample(&request).await?;

    if outcome.timed_out {
        warn!(
            "Listing {} timed out, returning {} partial results",
            root.display(),
            outcome.len()
        );
    }

    Ok(Listing {
        root,
        entries: outcome.entries,
        truncated: outcome.truncated,
        refused: false,
    })
}

fn absolutize(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| SampleError::PathAccess {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(dir))
}

fn is_filesystem_root(path: &Path) -> bool {
    let normalized = normalize(path);
    normalized.parent().is_none()
}

fn is_home_dir(path: &Path) -> bool {
    let Some(home) = dirs::home_dir() else {
        return false;
    };
    if normalize(path) == normalize(&home) {
        return true;
    }
    match (path.canonicalize(), home.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Lexically resolve `.` and `..`
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn display_relative(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
