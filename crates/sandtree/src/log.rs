use slog::{o, Drain as _, Logger};
use slog_async::Async;
use slog_term::{FullFormat, PlainSyncDecorator, TestStdoutWriter};

pub fn discard_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

pub fn test_logger() -> Logger {
    let decorator = PlainSyncDecorator::new(TestStdoutWriter);
    let drain = FullFormat::new(decorator).build().fuse();
    let drain = Async::new(drain).build().fuse();
    Logger::root(drain, o!())
}
