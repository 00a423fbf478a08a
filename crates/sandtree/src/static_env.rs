use crate::env::fatal;
use anyhow::{Context as _, Result};
use slog::{debug, Logger};
use std::{
    fs,
    os::unix::fs::symlink,
    path::{Path, PathBuf},
};

// (target, link) pairs, with targets relative to the link's directory, the
// way a checked-out tree would carry them.
const SYMLINKS: [(&str, &str); 4] = [
    ("dne", "bad_symlink"),
    ("dir1", "symlink_to_dir"),
    ("empty_file", "symlink_to_empty_file"),
    ("dir3", "dir1/dir2/symlink_to_dir3"),
];

const DIRS: [&str; 3] = ["dir1", "dir1/dir2", "dir1/dir2/dir3"];

const FILES: [&str; 7] = [
    "empty_file",
    "non_empty_file",
    "dir1/file1",
    "dir1/file2",
    "dir1/dir2/afile3",
    "dir1/dir2/file4",
    "dir1/dir2/dir3/file5",
];

const NON_EMPTY_CONTENT: &[u8] = b"static test env non-empty file\n";

/// A fixed, known directory shape for tests that assert enumeration and
/// traversal results. The regular entries are expected to pre-exist (they
/// are ordinary repository content); only the symlink entries are created
/// here, because not every checkout path preserves symlinks, and exactly
/// those entries are removed again on drop. Everything else in the tree is
/// never mutated.
pub struct StaticTestEnv {
    root: PathBuf,
    log: Logger,
}

impl StaticTestEnv {
    /// Wrap an existing tree rooted at `root`, creating the symlink entries.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_logger(root, crate::log::discard_logger())
    }

    pub fn with_logger(root: impl Into<PathBuf>, log: Logger) -> Self {
        fatal(Self::acquire(root.into(), log))
    }

    /// Materialize the full non-symlink manifest under `root` first, then
    /// create the symlink entries. For tests that have no checked-out copy
    /// of the tree, typically pointed inside a
    /// [`ScopedTestEnv`](crate::ScopedTestEnv).
    pub fn populate(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        fatal(Self::build_manifest(&root));
        Self::new(root)
    }

    fn build_manifest(root: &Path) -> Result<()> {
        for dir in DIRS {
            let path = root.join(dir);
            fs::create_dir_all(&path)
                .with_context(|| format!("create_dir_all(\"{}\")", path.display()))?;
        }
        for file in FILES {
            let path = root.join(file);
            let content = if file == "non_empty_file" {
                NON_EMPTY_CONTENT
            } else {
                &[]
            };
            fs::write(&path, content)
                .with_context(|| format!("write(\"{}\")", path.display()))?;
        }
        Ok(())
    }

    fn acquire(root: PathBuf, log: Logger) -> Result<Self> {
        for (target, link) in SYMLINKS {
            let link = root.join(link);
            symlink(target, &link)
                .with_context(|| format!("symlink(\"{target}\", \"{}\")", link.display()))?;
            debug!(log, "created static env symlink"; "target" => target, "link" => %link.display());
        }
        Ok(Self { root, log })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    pub fn file(&self) -> PathBuf {
        self.empty_file()
    }

    pub fn empty_file(&self) -> PathBuf {
        self.path("empty_file")
    }

    pub fn non_empty_file(&self) -> PathBuf {
        self.path("non_empty_file")
    }

    pub fn dir(&self) -> PathBuf {
        self.path("dir1")
    }

    pub fn dir2(&self) -> PathBuf {
        self.path("dir1/dir2")
    }

    pub fn dir3(&self) -> PathBuf {
        self.path("dir1/dir2/dir3")
    }

    pub fn symlink_to_file(&self) -> PathBuf {
        self.path("symlink_to_empty_file")
    }

    pub fn symlink_to_dir(&self) -> PathBuf {
        self.path("symlink_to_dir")
    }

    pub fn bad_symlink(&self) -> PathBuf {
        self.path("bad_symlink")
    }

    /// A path that does not exist anywhere under the tree.
    pub fn dne(&self) -> PathBuf {
        self.path("DNE")
    }

    /// A character device outside the tree. Hopefully this exists.
    pub fn char_file(&self) -> PathBuf {
        PathBuf::from("/dev/null")
    }

    pub fn files(&self) -> Vec<PathBuf> {
        ["empty_file", "non_empty_file", "dir1/file1", "dir1/file2"]
            .iter()
            .map(|p| self.path(p))
            .collect()
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        DIRS.iter().map(|p| self.path(p)).collect()
    }

    /// Expected entries of one-level iteration over `dir1`.
    pub fn dir_iteration_list(&self) -> Vec<PathBuf> {
        ["dir1/dir2", "dir1/file1", "dir1/file2"]
            .iter()
            .map(|p| self.path(p))
            .collect()
    }

    /// Expected entries of one-level iteration over `dir1/dir2`.
    pub fn dir_iteration_list_depth1(&self) -> Vec<PathBuf> {
        [
            "dir1/dir2/afile3",
            "dir1/dir2/dir3",
            "dir1/dir2/symlink_to_dir3",
            "dir1/dir2/file4",
        ]
        .iter()
        .map(|p| self.path(p))
        .collect()
    }

    /// Expected entries of recursive iteration over `dir1`, symlinks not
    /// followed.
    pub fn recursive_iteration_list(&self) -> Vec<PathBuf> {
        [
            "dir1/dir2",
            "dir1/file1",
            "dir1/file2",
            "dir1/dir2/afile3",
            "dir1/dir2/dir3",
            "dir1/dir2/symlink_to_dir3",
            "dir1/dir2/file4",
            "dir1/dir2/dir3/file5",
        ]
        .iter()
        .map(|p| self.path(p))
        .collect()
    }

    /// Expected entries of recursive iteration over `dir1` with symlinks
    /// followed.
    pub fn recursive_follow_symlinks_iteration_list(&self) -> Vec<PathBuf> {
        [
            "dir1/dir2",
            "dir1/file1",
            "dir1/file2",
            "dir1/dir2/afile3",
            "dir1/dir2/dir3",
            "dir1/dir2/file4",
            "dir1/dir2/dir3/file5",
            "dir1/dir2/symlink_to_dir3",
            "dir1/dir2/symlink_to_dir3/file5",
        ]
        .iter()
        .map(|p| self.path(p))
        .collect()
    }

    fn release(&self) -> Result<()> {
        for (_, link) in SYMLINKS {
            let link = self.root.join(link);
            fs::remove_file(&link)
                .with_context(|| format!("remove_file(\"{}\")", link.display()))?;
            debug!(self.log, "removed static env symlink"; "link" => %link.display());
        }
        Ok(())
    }
}

impl Drop for StaticTestEnv {
    fn drop(&mut self) {
        fatal(self.release());
    }
}
