//! File tracing for generation sessions
//!
//! Hosts call [`TracingLevel::init_file_tracing`] once; the log file is only created when
//! the first event passes the level filter.

mod lazy_file_writer;
mod tracing;

pub use lazy_file_writer::LazyFileWriter;
pub use self::tracing::{DynamicFilter, TRACE_LOG_FILE_NAME, TracingLevel};
