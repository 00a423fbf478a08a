use anyhow::{bail, Context as _, Result};
use rand::Rng as _;
use slog::{debug, Logger};
use std::{
    env, fs,
    path::{Component, Path, PathBuf},
};

/// Convert a setup/teardown failure into the fatal tier. A test environment
/// that cannot be built or destroyed invalidates every assertion after it.
pub(crate) fn fatal<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("fatal test environment failure: {err:#}"),
    }
}

/// A uniquely named directory tree under the host temporary directory. Every
/// entry created through it lives under [`root`](Self::root), and the whole
/// tree is removed when the value is dropped, no matter how control leaves
/// the test.
pub struct ScopedTestEnv {
    root: PathBuf,
    log: Logger,
}

impl ScopedTestEnv {
    pub fn new() -> Self {
        Self::with_logger(crate::log::discard_logger())
    }

    pub fn with_logger(log: Logger) -> Self {
        fatal(Self::acquire(log))
    }

    fn acquire(log: Logger) -> Result<Self> {
        // The random suffix is the only isolation between concurrently
        // running test processes sharing one temporary directory.
        let suffix: u32 = rand::rng().random_range(0..0x100_0000);
        let root = env::temp_dir().join(format!("sandtree.{suffix:06x}"));
        fs::create_dir(&root).with_context(|| format!("create_dir(\"{}\")", root.display()))?;
        // Resolve the root before handing out any paths. Path comparisons
        // downstream assume a symlink-free form, and canonicalize requires
        // the path to exist, so this happens after create_dir.
        let root = fs::canonicalize(&root)
            .with_context(|| format!("canonicalize(\"{}\")", root.display()))?;
        debug!(log, "acquired test environment"; "root" => %root.display());
        Ok(Self { root, log })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `rel` under the root without touching the filesystem. Fatal
    /// if `rel` contains a parent-directory component or is not relative:
    /// nothing handed out by the environment may escape its root.
    pub fn make_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        fatal(self.sandboxed(rel.as_ref()))
    }

    fn sandboxed(&self, rel: &Path) -> Result<PathBuf> {
        for component in rel.components() {
            match component {
                Component::ParentDir => {
                    bail!("path \"{}\" escapes the test environment root", rel.display())
                }
                Component::RootDir | Component::Prefix(_) => {
                    bail!(
                        "path \"{}\" is not relative to the test environment root",
                        rel.display()
                    )
                }
                Component::CurDir | Component::Normal(_) => {}
            }
        }
        Ok(self.root.join(rel))
    }

    /// Create a regular file of exactly `size` bytes. `size` is a `u64`, so
    /// lengths past the 32-bit signed range are valid on 64-bit hosts.
    pub fn create_file(&self, name: impl AsRef<Path>, size: u64) -> PathBuf {
        fatal(self.try_create_file(name.as_ref(), size))
    }

    fn try_create_file(&self, name: &Path, size: u64) -> Result<PathBuf> {
        let path = self.sandboxed(name)?;
        let file =
            fs::File::create(&path).with_context(|| format!("create(\"{}\")", path.display()))?;
        file.set_len(size)
            .with_context(|| format!("set_len(\"{}\", {size})", path.display()))?;
        debug!(self.log, "created file"; "path" => %path.display(), "size" => size);
        Ok(path)
    }

    pub fn create_dir(&self, name: impl AsRef<Path>) -> PathBuf {
        fatal(self.try_create_dir(name.as_ref()))
    }

    fn try_create_dir(&self, name: &Path) -> Result<PathBuf> {
        let path = self.sandboxed(name)?;
        fs::create_dir(&path).with_context(|| format!("create_dir(\"{}\")", path.display()))?;
        debug!(self.log, "created directory"; "path" => %path.display());
        Ok(path)
    }

    pub fn create_hardlink(&self, target: impl AsRef<Path>, link: impl AsRef<Path>) -> PathBuf {
        fatal(self.try_create_hardlink(target.as_ref(), link.as_ref()))
    }

    fn try_create_hardlink(&self, target: &Path, link: &Path) -> Result<PathBuf> {
        let target = self.sandboxed(target)?;
        let link = self.sandboxed(link)?;
        fs::hard_link(&target, &link).with_context(|| {
            format!(
                "hard_link(\"{}\", \"{}\")",
                target.display(),
                link.display()
            )
        })?;
        debug!(self.log, "created hard link"; "target" => %target.display(), "link" => %link.display());
        Ok(link)
    }

    fn release(&self) -> Result<()> {
        // Permission bits toggled by the test body must not block removal.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            for entry in walkdir::WalkDir::new(&self.root) {
                let entry =
                    entry.with_context(|| format!("walk(\"{}\")", self.root.display()))?;
                if entry.file_type().is_symlink() {
                    continue;
                }
                fs::set_permissions(entry.path(), fs::Permissions::from_mode(0o777))
                    .with_context(|| {
                        format!("set_permissions(\"{}\")", entry.path().display())
                    })?;
            }
        }
        fs::remove_dir_all(&self.root)
            .with_context(|| format!("remove_dir_all(\"{}\")", self.root.display()))?;
        debug!(self.log, "released test environment"; "root" => %self.root.display());
        Ok(())
    }
}

#[cfg(unix)]
impl ScopedTestEnv {
    /// Both arguments are resolved under the root. The target does not have
    /// to exist, so dangling links can be set up deliberately.
    pub fn create_symlink(&self, target: impl AsRef<Path>, link: impl AsRef<Path>) -> PathBuf {
        fatal(self.try_create_symlink(target.as_ref(), link.as_ref()))
    }

    fn try_create_symlink(&self, target: &Path, link: &Path) -> Result<PathBuf> {
        let target = self.sandboxed(target)?;
        let link = self.sandboxed(link)?;
        std::os::unix::fs::symlink(&target, &link).with_context(|| {
            format!("symlink(\"{}\", \"{}\")", target.display(), link.display())
        })?;
        debug!(self.log, "created symlink"; "target" => %target.display(), "link" => %link.display());
        Ok(link)
    }

    pub fn create_fifo(&self, name: impl AsRef<Path>) -> PathBuf {
        fatal(self.try_create_fifo(name.as_ref()))
    }

    fn try_create_fifo(&self, name: &Path) -> Result<PathBuf> {
        let path = self.sandboxed(name)?;
        nix::unistd::mkfifo(&path, nix::sys::stat::Mode::from_bits_truncate(0o644))
            .with_context(|| format!("mkfifo(\"{}\")", path.display()))?;
        debug!(self.log, "created fifo"; "path" => %path.display());
        Ok(path)
    }

    /// Create a socket file by binding and immediately dropping a listener.
    /// Fatal on platforms whose capability flags report no socket-file
    /// support.
    pub fn create_socket(&self, name: impl AsRef<Path>) -> PathBuf {
        fatal(self.try_create_socket(name.as_ref()))
    }

    fn try_create_socket(&self, name: &Path) -> Result<PathBuf> {
        if !crate::caps().unix_domain_sockets {
            bail!("socket files are not supported on this platform");
        }
        let path = self.sandboxed(name)?;
        let _listener = std::os::unix::net::UnixListener::bind(&path)
            .with_context(|| format!("bind(\"{}\")", path.display()))?;
        debug!(self.log, "created socket"; "path" => %path.display());
        Ok(path)
    }
}

impl Default for ScopedTestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ScopedTestEnv {
    fn drop(&mut self) {
        fatal(self.release());
    }
}
