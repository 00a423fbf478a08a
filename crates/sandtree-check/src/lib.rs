//! Pure comparison helpers for filesystem conformance tests: path and
//! sequence equality, error-condition set matching, and the expected-error
//! oracle that validates the shape of a caught [`FsError`].

use sandtree::error::condition_text;
use sandtree::FsError;
use std::{
    error,
    fmt::{self, Display, Formatter, Write as _},
    io,
    path::{Path, PathBuf},
};

/// Two paths are equal iff their native encoded forms are byte-identical.
/// No normalization is performed; compare already-normalized forms when that
/// is the intent.
pub fn path_eq(a: impl AsRef<Path>, b: impl AsRef<Path>) -> bool {
    a.as_ref().as_os_str().as_encoded_bytes() == b.as_ref().as_os_str().as_encoded_bytes()
}

/// Lockstep comparison from the front. Equal iff both sequences run out at
/// the same position with all compared elements equal.
pub fn sequences_eq<A, B>(a: A, b: B) -> bool
where
    A: IntoIterator,
    B: IntoIterator,
    A::Item: PartialEq<B::Item>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
    }
}

/// Lockstep comparison from the back, for validating that an ordering also
/// holds under bidirectional iteration.
pub fn sequences_eq_backwards<A, B>(a: A, b: B) -> bool
where
    A: IntoIterator,
    B: IntoIterator,
    A::IntoIter: DoubleEndedIterator,
    B::IntoIter: DoubleEndedIterator,
    A::Item: PartialEq<B::Item>,
{
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next_back(), b.next_back()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x == y => {}
            _ => return false,
        }
    }
}

/// True iff the observed condition is any one of the candidates. One logical
/// failure can legitimately surface under more than one platform-specific
/// code, so tests list every acceptable classification. An empty candidate
/// set never matches.
pub fn error_is(observed: io::ErrorKind, candidates: &[io::ErrorKind]) -> bool {
    candidates.contains(&observed)
}

fn opt_path_eq(a: Option<&Path>, b: Option<&Path>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => path_eq(a, b),
        _ => false,
    }
}

/// The expected shape of a caught [`FsError`]: classification, zero/one/two
/// associated paths in order, the originating operation, and optionally the
/// exact rendered diagnostic.
pub struct ExpectedError {
    kind: io::ErrorKind,
    op: &'static str,
    path1: Option<PathBuf>,
    path2: Option<PathBuf>,
    context: Option<String>,
    check_message: bool,
}

impl ExpectedError {
    pub fn new(kind: io::ErrorKind, op: &'static str) -> Self {
        Self {
            kind,
            op,
            path1: None,
            path2: None,
            context: None,
            check_message: true,
        }
    }

    pub fn with_path(kind: io::ErrorKind, op: &'static str, path: impl Into<PathBuf>) -> Self {
        let mut this = Self::new(kind, op);
        this.path1 = Some(path.into());
        this
    }

    pub fn with_paths(
        kind: io::ErrorKind,
        op: &'static str,
        path1: impl Into<PathBuf>,
        path2: impl Into<PathBuf>,
    ) -> Self {
        let mut this = Self::with_path(kind, op, path1);
        this.path2 = Some(path2.into());
        this
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Skip the rendered-diagnostic comparison and validate only the
    /// classification, paths, and operation.
    pub fn without_message_check(mut self) -> Self {
        self.check_message = false;
        self
    }

    pub fn matches(&self, err: &FsError) -> bool {
        self.verify(err).is_ok()
    }

    /// Validate `err` against the expected shape, recording every
    /// independent mismatch rather than stopping at the first.
    pub fn verify(&self, err: &FsError) -> Result<(), CheckError> {
        let mut mismatches = Vec::new();
        if err.kind() != self.kind {
            mismatches.push(format!(
                "condition: expected {:?}, got {:?}",
                self.kind,
                err.kind()
            ));
        }
        if err.op() != self.op {
            mismatches.push(format!("operation: expected {:?}, got {:?}", self.op, err.op()));
        }
        // Path comparison is byte identity of the native forms, like
        // path_eq: "from/" and "from" are different paths here even though
        // they compare equal component-wise.
        if !opt_path_eq(err.path1(), self.path1.as_deref()) {
            mismatches.push(format!(
                "path1: expected {:?}, got {:?}",
                self.path1,
                err.path1()
            ));
        }
        if !opt_path_eq(err.path2(), self.path2.as_deref()) {
            mismatches.push(format!(
                "path2: expected {:?}, got {:?}",
                self.path2,
                err.path2()
            ));
        }
        if self.check_message {
            let expected = self.expected_message();
            let actual = err.to_string();
            if actual != expected {
                mismatches.push(format!(
                    "message: expected {expected:?}, got {actual:?}"
                ));
            }
        }
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(CheckError { mismatches })
        }
    }

    /// The exact diagnostic an [`FsError`] of this shape renders: the path
    /// brackets are omitted entirely when no paths are expected, and an
    /// empty expected path renders as `""`.
    pub fn expected_message(&self) -> String {
        let mut message = format!("filesystem error: in {}: ", self.op);
        if let Some(context) = &self.context {
            message.push_str(context);
            message.push_str(": ");
        }
        message.push_str(&condition_text(self.kind));
        for path in [&self.path1, &self.path2].into_iter().flatten() {
            if path.as_os_str().is_empty() {
                message.push_str(" [\"\"]");
            } else {
                let _ = write!(message, " [{}]", path.display());
            }
        }
        message
    }
}

/// Every mismatch found by [`ExpectedError::verify`], one line each.
#[derive(Debug)]
pub struct CheckError {
    mismatches: Vec<String>,
}

impl CheckError {
    pub fn mismatches(&self) -> &[String] {
        &self.mismatches
    }
}

impl Display for CheckError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "error shape mismatch: {}", self.mismatches.join("; "))
    }
}

impl error::Error for CheckError {}

/// Path spellings that exercise decomposition edge cases: empty, separator
/// runs, dot and dot-dot segments, trailing separators, and drive/share
/// prefixes that only mean something on some hosts.
pub const PATH_CORPUS: &[&str] = &[
    "",
    " ",
    "//",
    ".",
    "..",
    "foo",
    "/",
    "/foo",
    "foo/",
    "/foo/",
    "foo/bar",
    "/foo/bar",
    "//net",
    "//net/foo",
    "///foo///",
    "///foo///bar",
    "/.",
    "./",
    "/..",
    "../",
    "foo/.",
    "foo/..",
    "foo/./",
    "foo/./bar",
    "foo/../",
    "foo/../bar",
    "c:",
    "c:/",
    "c:foo",
    "c:/foo",
    "c:foo/",
    "c:/foo/",
    "c:/foo/bar",
    "prn:",
    "c:\\",
    "c:\\foo",
    "c:foo\\",
    "c:\\foo\\",
    "c:\\foo/",
    "c:/foo\\bar",
    "/finally/we/need/one/really/really/really/really/really/really/really/long/string",
];

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::ErrorKind;

    #[test]
    fn path_eq_is_byte_identity() {
        assert!(path_eq("a/b", "a/b"));
        assert!(!path_eq("a/b", "a/b/"));
        assert!(!path_eq("a//b", "a/b"));
        assert!(path_eq("", ""));
    }

    #[test]
    fn equal_sequences_compare_equal_both_ways() {
        let a = [1, 2, 3];
        let b = [1, 2, 3];
        assert!(sequences_eq(a, b));
        assert!(sequences_eq_backwards(a, b));
    }

    #[test]
    fn single_mutation_breaks_equality_both_ways() {
        let a = [1, 2, 3];
        for i in 0..a.len() {
            let mut b = a;
            b[i] += 10;
            assert!(!sequences_eq(a, b));
            assert!(!sequences_eq_backwards(a, b));
        }
    }

    #[test]
    fn length_mismatch_is_unequal() {
        assert!(!sequences_eq([1, 2], [1, 2, 3]));
        assert!(!sequences_eq([1, 2, 3], [1, 2]));
        assert!(!sequences_eq_backwards([2, 3], [1, 2, 3]));
        assert!(sequences_eq([0i32; 0], [0i32; 0]));
        assert!(sequences_eq_backwards([0i32; 0], [0i32; 0]));
    }

    #[test]
    fn error_is_checks_set_membership() {
        use ErrorKind::*;
        assert!(error_is(NotFound, &[PermissionDenied, NotFound]));
        assert!(!error_is(NotFound, &[PermissionDenied, AlreadyExists]));
        assert!(!error_is(NotFound, &[]));
    }

    #[test]
    fn matching_error_passes_verification() {
        let err = FsError::new("rename", ErrorKind::NotFound.into())
            .with_path1("from")
            .with_path2("to");
        let expected = ExpectedError::with_paths(ErrorKind::NotFound, "rename", "from", "to");
        assert_matches!(expected.verify(&err), Ok(()));
        assert!(expected.matches(&err));
    }

    #[test]
    fn every_mismatch_is_reported() {
        let err = FsError::new("remove", ErrorKind::PermissionDenied.into()).with_path1("p");
        let expected = ExpectedError::with_paths(ErrorKind::NotFound, "rename", "from", "to");
        let failure = expected.verify(&err).unwrap_err();
        // condition, operation, path1, path2, and message all differ
        assert_eq!(failure.mismatches().len(), 5);
    }

    #[test]
    fn verification_compares_paths_by_native_bytes() {
        // A trailing separator is a different path even though Path's own
        // PartialEq treats the two as equal component-wise.
        let err = FsError::new("rename", ErrorKind::NotFound.into()).with_path1("from");
        let expected = ExpectedError::with_path(ErrorKind::NotFound, "rename", "from/")
            .without_message_check();
        assert!(!expected.matches(&err));
        let failure = expected.verify(&err).unwrap_err();
        assert_eq!(failure.mismatches().len(), 1);
        assert!(failure.mismatches()[0].starts_with("path1"));

        let err = FsError::new("copy", ErrorKind::NotFound.into())
            .with_path1("a/b")
            .with_path2("a//b");
        let expected = ExpectedError::with_paths(ErrorKind::NotFound, "copy", "a/b", "a/b")
            .without_message_check();
        let failure = expected.verify(&err).unwrap_err();
        assert_eq!(failure.mismatches().len(), 1);
        assert!(failure.mismatches()[0].starts_with("path2"));
    }

    #[test]
    fn message_shape_with_no_paths_has_no_brackets() {
        let expected = ExpectedError::new(ErrorKind::PermissionDenied, "current_path");
        assert!(!expected.expected_message().contains('['));
    }

    #[test]
    fn message_shape_renders_empty_paths_quoted() {
        let expected = ExpectedError::with_paths(ErrorKind::NotFound, "canonical", "", "x");
        assert!(expected.expected_message().ends_with(" [\"\"] [x]"));
        let err = FsError::new("canonical", ErrorKind::NotFound.into())
            .with_path1("")
            .with_path2("x");
        assert!(expected.matches(&err));
    }

    #[test]
    fn context_is_part_of_the_message() {
        let expected =
            ExpectedError::new(ErrorKind::PermissionDenied, "copy").context("cannot copy symlink");
        let err = FsError::new("copy", ErrorKind::PermissionDenied.into());
        // context only affects the rendered message, not the carried fields
        assert!(!expected.matches(&err));
        let err = err.with_context("cannot copy symlink");
        assert!(expected.matches(&err));
    }

    #[test]
    fn message_check_can_be_disabled() {
        let expected = ExpectedError::new(ErrorKind::PermissionDenied, "copy")
            .context("some other wording")
            .without_message_check();
        let err = FsError::new("copy", ErrorKind::PermissionDenied.into());
        assert!(expected.matches(&err));
    }

    #[test]
    fn corpus_has_distinct_interesting_spellings() {
        assert!(PATH_CORPUS.contains(&""));
        assert!(PATH_CORPUS.contains(&".."));
        assert!(PATH_CORPUS.iter().any(|p| p.ends_with('/')));
    }
}
