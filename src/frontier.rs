//! Frontier queue and result set
//!
//! The frontier is a plain FIFO of directory patterns: push at the tail,
//! pop at the head. That ordering is what makes the walk level-by-level.
//! The result set keeps a hash index for duplicate checks next to an
//! append-only list for output order.

use crate::exclude::GitignoreStack;
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

// ═══════════════════════════════════════════════════════════════
// PATTERNS
// ═══════════════════════════════════════════════════════════════

/// "Children of `dir`", pending expansion
#[derive(Debug, Clone)]
pub struct DirPattern {
    pub dir: PathBuf,
    /// Depth of `dir` itself (root = 0)
    pub depth: usize,
    /// `.gitignore` matchers inherited from the ancestors of `dir`
    pub gitignores: GitignoreStack,
}

impl DirPattern {
    /// The root wildcard pattern
    pub fn root(root: &Path) -> Self {
        Self::children_of(root.to_path_buf(), 0)
    }

    /// Pattern for the children of a directory found at `depth`
    pub fn children_of(dir: PathBuf, depth: usize) -> Self {
        Self {
            dir,
            depth,
            gitignores: GitignoreStack::default(),
        }
    }

    pub fn with_gitignores(mut self, gitignores: GitignoreStack) -> Self {
        self.gitignores = gitignores;
        self
    }

    /// Depth that matched entries will have
    pub fn child_depth(&self) -> usize {
        self.depth + 1
    }

    /// Glob string for this pattern; the directory part is escaped so
    /// names containing `[`, `*` or `?` are taken literally
    pub fn glob(&self) -> String {
        let dir = self.dir.to_string_lossy();
        let escaped = glob::Pattern::escape(&dir);
        if escaped.ends_with('/') {
            format!("{}*", escaped)
        } else {
            format!("{}/*", escaped)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// FRONTIER
// ═══════════════════════════════════════════════════════════════

/// Pending directory patterns in breadth-first order
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<DirPattern>,
    /// Canonical directories already queued once
    expanded: HashSet<PathBuf>,
}

impl Frontier {
    /// A frontier holding only the root wildcard
    pub fn seeded(root: &Path) -> Self {
        let mut frontier = Self::default();
        let canonical = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        frontier.expanded.insert(canonical);
        frontier.queue.push_back(DirPattern::root(root));
        frontier
    }

    pub fn push(&mut self, pattern: DirPattern) {
        self.queue.push_back(pattern);
    }

    pub fn pop(&mut self) -> Option<DirPattern> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Record a canonical directory; false if it was already seen
    pub fn mark_expanded(&mut self, canonical: PathBuf) -> bool {
        self.expanded.insert(canonical)
    }
}

// ═══════════════════════════════════════════════════════════════
// RESULTS
// ═══════════════════════════════════════════════════════════════

/// What a sampled path points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    File,
    Dir,
}

/// One path in a sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampledEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Immediate children of the root have depth 1
    pub depth: usize,
}

impl SampledEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Deduplicated, insertion-ordered, capped at `limit`
#[derive(Debug)]
pub struct ResultSet {
    limit: usize,
    seen: HashSet<PathBuf>,
    entries: Vec<SampledEntry>,
}

impl ResultSet {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            seen: HashSet::new(),
            entries: Vec::new(),
        }
    }

    /// Add an entry; false if it was a duplicate or the set is full
    pub fn insert(&mut self, entry: SampledEntry) -> bool {
        if self.is_full() || self.seen.contains(&entry.path) {
            return false;
        }
        self.seen.insert(entry.path.clone());
        self.entries.push(entry);
        true
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<SampledEntry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> SampledEntry {
        SampledEntry {
            path: PathBuf::from(path),
            kind: EntryKind::File,
            depth: 1,
        }
    }

    #[test]
    fn test_frontier_is_fifo() {
        let mut frontier = Frontier::seeded(Path::new("/nonexistent-root"));
        frontier.push(DirPattern::children_of("/nonexistent-root/a".into(), 1));
        frontier.push(DirPattern::children_of("/nonexistent-root/b".into(), 1));

        assert_eq!(frontier.len(), 3);
        assert_eq!(frontier.pop().unwrap().depth, 0);
        assert_eq!(frontier.pop().unwrap().dir, PathBuf::from("/nonexistent-root/a"));
        assert_eq!(frontier.pop().unwrap().dir, PathBuf::from("/nonexistent-root/b"));
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_frontier_marks_root_expanded() {
        let mut frontier = Frontier::seeded(Path::new("/nonexistent-root"));
        assert!(!frontier.mark_expanded("/nonexistent-root".into()));
        assert!(frontier.mark_expanded("/nonexistent-root/a".into()));
        assert!(!frontier.mark_expanded("/nonexistent-root/a".into()));
    }

    #[test]
    fn test_glob_escapes_directory() {
        let pattern = DirPattern::root(Path::new("/w/[weird]"));
        assert_eq!(pattern.glob(), "/w/[[]weird[]]/*");
        assert_eq!(pattern.child_depth(), 1);
    }

    #[test]
    fn test_result_set_dedup_and_limit() {
        let mut results = ResultSet::with_limit(2);
        assert!(results.insert(file("/a")));
        assert!(!results.insert(file("/a")));
        assert!(results.insert(file("/b")));
        assert!(results.is_full());
        assert!(!results.insert(file("/c")));

        let paths: Vec<_> = results.into_entries().into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }
}
