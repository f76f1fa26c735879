//! Bounded breadth-first tree sampling
//!
//! Produces a level-order sample of a directory tree under a result cap
//! and a wall-clock budget:
//!
//! ```text
//! Frontier (FIFO of "dir/*" patterns)
//! │
//! ├── pop head → resolve (ignore rules applied) → add to results
//! │                                             → push "child/*" at tail
//! └── stop when frontier empties or results hit the limit
//!
//! Timer ── races the loop above; if it fires first the partial
//!          results come back marked truncated
//! ```
//!
//! Every entry at depth d is seen before any entry at depth d+1, so a
//! tight limit still gives a cross-section of the top of the tree.

use crate::config::SamplerConfig;
use crate::error::{Result, SampleError};
use crate::exclude::IgnoreSet;
use crate::frontier::{DirPattern, Frontier, ResultSet, SampledEntry};
use crate::resolve::{GlobResolver, PatternResolver, Resolution, ResolvedEntry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// One sampling call
#[derive(Debug, Clone)]
pub struct SampleRequest {
    pub root: PathBuf,
    pub recursive: bool,
    pub limit: usize,
    pub ignore: Arc<IgnoreSet>,
}

impl SampleRequest {
    /// A request with no ignore rules. The root is normalized by
    /// components, so `a//b/` and `a/b` walk and match the same way.
    pub fn new(root: impl Into<PathBuf>, recursive: bool, limit: usize) -> Self {
        Self {
            root: root.into().components().collect(),
            recursive,
            limit,
            ignore: Arc::new(IgnoreSet::empty()),
        }
    }

    pub fn ignoring(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = Arc::new(ignore);
        self
    }
}

/// Result of a sampling call
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Sampled entries in breadth-first order
    pub entries: Vec<SampledEntry>,
    /// More entries may exist (limit reached, timed out, or a level failed)
    pub truncated: bool,
    /// The walk was abandoned by the timeout
    pub timed_out: bool,
    /// Directories whose contents could not be resolved
    pub failed_levels: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl Outcome {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Breadth-first sampler over a pluggable resolver
pub struct TreeSampler<R = GlobResolver> {
    resolver: R,
    timeout: Duration,
}

impl TreeSampler<GlobResolver> {
    pub fn new(config: &SamplerConfig) -> Self {
        Self {
            resolver: GlobResolver {
                follow_symlinks: config.follow_symlinks,
            },
            timeout: config.timeout(),
        }
    }
}

impl Default for TreeSampler<GlobResolver> {
    fn default() -> Self {
        Self::new(&SamplerConfig::default())
    }
}

impl<R: PatternResolver> TreeSampler<R> {
    pub fn with_resolver(resolver: R, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Sample `request.root`; fails only if the root itself is unusable
    pub async fn sample(&self, request: &SampleRequest) -> Result<Outcome> {
        if request.limit == 0 {
            return Err(SampleError::InvalidLimit);
        }
        check_root(&request.root).await?;

        let start = Instant::now();
        let mut results = ResultSet::with_limit(request.limit);
        let mut frontier = Frontier::seeded(&request.root);
        let mut failed_levels = 0;

        let timed_out = {
            let walk = self.walk(request, &mut frontier, &mut results, &mut failed_levels);
            tokio::select! {
                _ = walk => false,
                _ = tokio::time::sleep(self.timeout) => true,
            }
        };

        if timed_out {
            warn!(
                "Sampling {} timed out after {:?}, returning {} partial results",
                request.root.display(),
                self.timeout,
                results.len()
            );
        }

        if failed_levels > 0 {
            warn!(
                "{} director{} under {} could not be resolved; sample is incomplete",
                failed_levels,
                if failed_levels == 1 { "y" } else { "ies" },
                request.root.display()
            );
        }

        let truncated = timed_out || results.is_full() || failed_levels > 0;
        let entries = results.into_entries();
        debug!(
            "Sampled {} entries under {} (truncated: {})",
            entries.len(),
            request.root.display(),
            truncated
        );

        Ok(Outcome {
            entries,
            truncated,
            timed_out,
            failed_levels,
            elapsed: start.elapsed(),
        })
    }

    async fn walk(
        &self,
        request: &SampleRequest,
        frontier: &mut Frontier,
        results: &mut ResultSet,
        failed_levels: &mut usize,
    ) {
        while !results.is_full() {
            let Some(pattern) = frontier.pop() else {
                break;
            };

            let Resolution {
                entries,
                gitignores,
                complete,
            } = self
                .resolver
                .resolve(&pattern, &request.root, Arc::clone(&request.ignore))
                .await;
            if !complete {
                *failed_levels += 1;
            }
            debug!(
                "Resolved {} entries at depth {} under {}",
                entries.len(),
                pattern.child_depth(),
                pattern.dir.display()
            );

            for ResolvedEntry { entry, canonical } in entries {
                if results.is_full() {
                    break;
                }

                let expand = request.recursive && entry.is_dir();
                let dir = entry.path.clone();
                let depth = entry.depth;
                if !results.insert(entry) || !expand {
                    continue;
                }

                let key = canonical.unwrap_or_else(|| dir.clone());
                if frontier.mark_expanded(key) {
                    frontier.push(
                        DirPattern::children_of(dir, depth).with_gitignores(gitignores.clone()),
                    );
                } else {
                    debug!("Not expanding {}: already visited", dir.display());
                }
            }
        }
    }
}

/// Sample with the default resolver and timeout
pub async fn sample(
    root: &Path,
    recursive: bool,
    limit: usize,
    ignore: IgnoreSet,
) -> Result<Outcome> {
    let request = SampleRequest::new(root, recursive, limit).ignoring(ignore);
    TreeSampler::<GlobResolver>::default().sample(&request).await
}

async fn check_root(root: &Path) -> Result<()> {
    let meta = tokio::fs::metadata(root)
        .await
        .map_err(|source| SampleError::PathAccess {
            path: root.to_path_buf(),
            source,
        })?;

    if !meta.is_dir() {
        return Err(SampleError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let _entries = tokio::fs::read_dir(root)
        .await
        .map_err(|source| SampleError::PathAccess {
            path: root.to_path_buf(),
            source,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::EntryKind;
    use async_trait::async_trait;
    use std::fs;
    use tempfile::TempDir;

    fn relative(outcome: &Outcome, root: &Path) -> Vec<String> {
        outcome
            .paths()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().to_string())
            .collect()
    }

    /// root/{a.txt, d1/{b.txt, d2/{c.txt}}}
    fn nested_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("d1/d2")).unwrap();
        fs::write(root.join("a.txt"), "").unwrap();
        fs::write(root.join("d1/b.txt"), "").unwrap();
        fs::write(root.join("d1/d2/c.txt"), "").unwrap();
        temp
    }

    #[tokio::test]
    async fn test_full_walk_is_level_order() {
        let temp = nested_tree();
        let root = temp.path();

        let outcome = sample(root, true, 100, IgnoreSet::empty()).await.unwrap();

        assert_eq!(
            relative(&outcome, root),
            vec!["a.txt", "d1", "d1/b.txt", "d1/d2", "d1/d2/c.txt"]
        );
        assert!(!outcome.truncated);
        assert!(!outcome.timed_out);

        let depths: Vec<usize> = outcome.entries.iter().map(|e| e.depth).collect();
        assert!(depths.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let temp = nested_tree();
        let outcome = sample(temp.path(), true, 3, IgnoreSet::empty()).await.unwrap();
        assert_eq!(outcome.len(), 3);
        assert!(outcome.truncated);
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn test_limit_equal_to_total_reports_truncated() {
        let temp = nested_tree();
        let outcome = sample(temp.path(), true, 5, IgnoreSet::empty()).await.unwrap();
        assert_eq!(outcome.len(), 5);
        assert!(outcome.truncated);
    }

    #[tokio::test]
    async fn test_non_recursive_lists_one_level() {
        let temp = nested_tree();
        let root = temp.path();
        let outcome = sample(root, false, 100, IgnoreSet::empty()).await.unwrap();
        assert_eq!(relative(&outcome, root), vec!["a.txt", "d1"]);
        assert_eq!(outcome.entries[1].kind, EntryKind::Dir);
        assert!(!outcome.truncated);
    }

    #[tokio::test]
    async fn test_zero_limit_rejected() {
        let temp = nested_tree();
        let err = sample(temp.path(), true, 0, IgnoreSet::empty()).await.unwrap_err();
        assert!(matches!(err, SampleError::InvalidLimit));
    }

    #[tokio::test]
    async fn test_missing_root_is_path_access() {
        let temp = TempDir::new().unwrap();
        let err = sample(&temp.path().join("missing"), true, 10, IgnoreSet::empty())
            .await
            .unwrap_err();
        assert!(err.is_path_access());
    }

    #[tokio::test]
    async fn test_file_root_is_path_access() {
        let temp = nested_tree();
        let err = sample(&temp.path().join("a.txt"), true, 10, IgnoreSet::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, SampleError::NotADirectory { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_cycle_is_not_reexpanded() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("loop")).unwrap();
        fs::write(root.join("loop/f.txt"), "").unwrap();
        std::os::unix::fs::symlink(root, root.join("loop/back")).unwrap();

        let outcome = sample(root, true, 1_000, IgnoreSet::empty()).await.unwrap();

        assert_eq!(relative(&outcome, root), vec!["loop", "loop/back", "loop/f.txt"]);
        assert!(!outcome.truncated);
        assert!(!outcome.timed_out);
    }

    /// Answers the first pattern at once, then never again
    struct StallingResolver;

    #[async_trait]
    impl PatternResolver for StallingResolver {
        async fn resolve(
            &self,
            pattern: &DirPattern,
            _root: &Path,
            _ignore: Arc<IgnoreSet>,
        ) -> Resolution {
            if pattern.depth > 0 {
                std::future::pending::<()>().await;
            }
            Resolution::new(vec![ResolvedEntry {
                entry: SampledEntry {
                    path: pattern.dir.join("sub"),
                    kind: EntryKind::Dir,
                    depth: 1,
                },
                canonical: None,
            }])
        }
    }

    #[tokio::test]
    async fn test_timeout_returns_partial_results() {
        let temp = TempDir::new().unwrap();
        let sampler = TreeSampler::with_resolver(StallingResolver, Duration::from_millis(50));
        let request = SampleRequest::new(temp.path(), true, 100);

        let outcome = sampler.sample(&request).await.unwrap();

        assert!(outcome.timed_out);
        assert!(outcome.truncated);
        assert_eq!(outcome.len(), 1);
        assert!(outcome.entries[0].path.ends_with("sub"));
    }

    /// Globs the real tree, but its blocking worker dies under `bad`
    struct PanickyResolver(GlobResolver);

    #[async_trait]
    impl PatternResolver for PanickyResolver {
        async fn resolve(
            &self,
            pattern: &DirPattern,
            root: &Path,
            ignore: Arc<IgnoreSet>,
        ) -> Resolution {
            if pattern.dir.ends_with("bad") {
                let died = crate::resolve::run_blocking(|| -> Resolution {
                    panic!("worker died")
                })
                .await;
                return died.unwrap_or_else(Resolution::failed);
            }
            self.0.resolve(pattern, root, ignore).await
        }
    }

    #[tokio::test]
    async fn test_failed_level_marks_truncated() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("bad")).unwrap();
        fs::write(root.join("bad/hidden.txt"), "").unwrap();
        fs::write(root.join("ok.txt"), "").unwrap();

        let sampler =
            TreeSampler::with_resolver(PanickyResolver(GlobResolver::default()), Duration::from_secs(5));
        let outcome = sampler
            .sample(&SampleRequest::new(root, true, 100))
            .await
            .unwrap();

        assert_eq!(relative(&outcome, root), vec!["bad", "ok.txt"]);
        assert_eq!(outcome.failed_levels, 1);
        assert!(outcome.truncated);
        assert!(!outcome.timed_out);
    }

    #[tokio::test]
    async fn test_doubled_separator_root_is_normalized() {
        let temp = nested_tree();
        let root = temp.path();
        let doubled = PathBuf::from(format!("{}//", root.display()));

        let request = SampleRequest::new(doubled, true, 100);
        assert_eq!(request.root, root);

        let outcome = TreeSampler::<GlobResolver>::default().sample(&request).await.unwrap();
        assert_eq!(
            relative(&outcome, root),
            vec!["a.txt", "d1", "d1/b.txt", "d1/d2", "d1/d2/c.txt"]
        );
    }
}
