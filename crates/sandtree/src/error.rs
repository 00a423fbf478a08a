use std::{
    error,
    fmt::{self, Display, Formatter},
    io,
    path::{Path, PathBuf},
};

/// The canonical message text for an error classification. The diagnostic
/// format below is built from this rather than from the raw OS message, so
/// that the rendered shape is predictable from the classification alone.
pub fn condition_text(kind: io::ErrorKind) -> String {
    io::Error::from(kind).to_string()
}

/// Error raised by a filesystem operation, carrying the operation name and
/// the path or paths involved. Renders as
/// `filesystem error: in <op>: [<context>: ]<condition text>` followed by
/// ` [<path>]` for each associated path, an empty path rendering as `""`.
#[derive(Debug)]
pub struct FsError {
    op: &'static str,
    context: Option<String>,
    path1: Option<PathBuf>,
    path2: Option<PathBuf>,
    source: io::Error,
}

impl FsError {
    pub fn new(op: &'static str, source: io::Error) -> Self {
        Self {
            op,
            context: None,
            path1: None,
            path2: None,
            source,
        }
    }

    pub fn with_path1(mut self, path: impl Into<PathBuf>) -> Self {
        self.path1 = Some(path.into());
        self
    }

    pub fn with_path2(mut self, path: impl Into<PathBuf>) -> Self {
        self.path2 = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn op(&self) -> &str {
        self.op
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn path1(&self) -> Option<&Path> {
        self.path1.as_deref()
    }

    pub fn path2(&self) -> Option<&Path> {
        self.path2.as_deref()
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

fn render_path(f: &mut Formatter<'_>, path: &Path) -> fmt::Result {
    if path.as_os_str().is_empty() {
        write!(f, " [\"\"]")
    } else {
        write!(f, " [{}]", path.display())
    }
}

impl Display for FsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "filesystem error: in {}: ", self.op)?;
        if let Some(context) = &self.context {
            write!(f, "{context}: ")?;
        }
        write!(f, "{}", condition_text(self.source.kind()))?;
        for path in [&self.path1, &self.path2].into_iter().flatten() {
            render_path(f, path)?;
        }
        Ok(())
    }
}

impl error::Error for FsError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.source)
    }
}
