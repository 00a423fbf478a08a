//! Test-support machinery for filesystem conformance suites: a disposable
//! directory tree with guaranteed teardown on every exit path, a fixed
//! read-only tree for traversal tests, and the typed error those suites
//! match against.

pub mod caps;
pub mod env;
pub mod error;
pub mod log;
#[cfg(unix)]
pub mod static_env;

pub use caps::{caps, Capabilities};
pub use env::ScopedTestEnv;
pub use error::FsError;
#[cfg(unix)]
pub use static_env::StaticTestEnv;
