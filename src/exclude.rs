//! Ignore rules for sampling
//!
//! Patterns are glob-style and rooted at any depth:
//! - `node_modules`, `.*` match a single path component anywhere
//! - `target/dependency` matches that run of components anywhere
//!
//! Anything matched is dropped from results and never expanded, so no
//! descendant of an excluded directory can show up either.
//!
//! `.gitignore` files are picked up per directory as the walk reaches
//! them; each directory's entries are checked against the matchers of
//! all its ancestors (`GitignoreStack`).

use glob::{MatchOptions, Pattern};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::{debug, warn};

/// Build, dependency and cache directories plus dot entries
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    "__pycache__",
    "env",
    "venv",
    "target/dependency",
    "build/dependencies",
    "dist",
    "out",
    "bundle",
    "vendor",
    "tmp",
    "temp",
    "deps",
    "pkg",
    "Pods",
    ".*",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled ignore rules
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    /// Single-component patterns
    names: Vec<Pattern>,
    /// Multi-component patterns, one glob per component
    runs: Vec<Vec<Pattern>>,
    /// Load `.gitignore` files while walking
    gitignore: bool,
}

impl IgnoreSet {
    /// Compile patterns; malformed ones are skipped and match nothing
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for raw in patterns {
            set.add(raw.as_ref());
        }
        set
    }

    /// The default ignore list
    pub fn defaults() -> Self {
        Self::new(DEFAULT_IGNORES)
    }

    /// No rules at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add one pattern, returning whether it compiled
    pub fn add(&mut self, raw: &str) -> bool {
        let trimmed = normalize(raw);
        if trimmed.is_empty() {
            return false;
        }

        let parts: Vec<&str> = trimmed.split('/').filter(|p| !p.is_empty()).collect();
        let compiled: Result<Vec<Pattern>, _> = parts.iter().map(|p| Pattern::new(p)).collect();

        match compiled {
            Ok(mut globs) if globs.len() == 1 => {
                self.names.extend(globs.pop());
                true
            }
            Ok(globs) => {
                self.runs.push(globs);
                true
            }
            Err(e) => {
                warn!("Skipping malformed ignore pattern '{}': {}", raw, e);
                false
            }
        }
    }

    /// Also honor `.gitignore` files found in walked directories
    pub fn with_gitignore(mut self) -> Self {
        self.gitignore = true;
        self
    }

    pub fn uses_gitignore(&self) -> bool {
        self.gitignore
    }

    /// Number of compiled glob rules (gitignore not counted)
    pub fn len(&self) -> usize {
        self.names.len() + self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0 && !self.gitignore
    }

    /// Check `path` (under `root`) against the glob rules
    pub fn is_excluded(&self, path: &Path, root: &Path) -> bool {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let components: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if components.is_empty() {
            return false;
        }

        let name_hit = components
            .iter()
            .any(|c| self.names.iter().any(|p| p.matches_with(c, MATCH_OPTIONS)));
        if name_hit {
            return true;
        }

        self.runs.iter().any(|run| {
            run.len() <= components.len()
                && components.windows(run.len()).any(|window| {
                    run.iter()
                        .zip(window)
                        .all(|(p, c)| p.matches_with(c, MATCH_OPTIONS))
                })
        })
    }
}

/// Load `<dir>/.gitignore`; missing or broken files give None
pub fn load_gitignore(dir: &Path) -> Option<Gitignore> {
    let gi_path = dir.join(".gitignore");
    if !gi_path.is_file() {
        return None;
    }

    let mut builder = GitignoreBuilder::new(dir);
    if let Some(e) = builder.add(&gi_path) {
        warn!("Failed to read {}: {}", gi_path.display(), e);
        return None;
    }
    match builder.build() {
        Ok(gi) => {
            debug!("Loaded .gitignore for {}", dir.display());
            Some(gi)
        }
        Err(e) => {
            warn!("Failed to load .gitignore for {}: {}", dir.display(), e);
            None
        }
    }
}

/// `.gitignore` matchers of a directory and its ancestors, outermost first
#[derive(Debug, Clone, Default)]
pub struct GitignoreStack {
    matchers: Vec<Arc<Gitignore>>,
}

impl GitignoreStack {
    /// A copy of this stack with one more (deeper) matcher on top
    pub fn push(&self, gi: Gitignore) -> Self {
        let mut matchers = self.matchers.clone();
        matchers.push(Arc::new(gi));
        Self { matchers }
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// The deepest matcher with an opinion decides, so a nested `!pattern`
    /// can re-include what an outer file ignored
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        for gi in self.matchers.iter().rev() {
            // Hand the matcher a root-relative path; it never has to strip
            // its own root, which only works on byte-identical prefixes
            let Ok(relative) = path.strip_prefix(gi.path()) else {
                continue;
            };
            if relative.as_os_str().is_empty() {
                continue;
            }
            let matched = gi.matched_path_or_any_parents(relative, is_dir);
            if matched.is_ignore() {
                return true;
            }
            if matched.is_whitelist() {
                return false;
            }
        }
        false
    }
}

/// Strip the `**/` prefix and `/`, `/**` suffixes people tend to write
fn normalize(raw: &str) -> &str {
    let mut s = raw.trim();
    while let Some(rest) = s.strip_prefix("**/") {
        s = rest;
    }
    loop {
        if let Some(rest) = s.strip_suffix("/**") {
            s = rest;
        } else if let Some(rest) = s.strip_suffix('/') {
            s = rest;
        } else {
            break;
        }
    }
    s
}
