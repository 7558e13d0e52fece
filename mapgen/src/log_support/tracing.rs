use std::path::PathBuf;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use error_stack::Report;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tracing::Level;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::lazy_file_writer::LazyFileWriter;
use crate::error::{Error, Result};

/// Name of the trace log in the temp directory
pub const TRACE_LOG_FILE_NAME: &str = "mapgen_trace.log";

/// Environment variable holding the initial level
const LEVEL_ENV_VAR: &str = "MAPGEN_LOG";

static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(1); // WARN until a level is chosen

/// Tracing filter whose level can be changed while the subscriber is installed
#[derive(Clone)]
pub struct DynamicFilter;

impl<S> Layer<S> for DynamicFilter
where
    S: Subscriber,
{
    fn enabled(
        &self,
        metadata: &tracing::Metadata<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        if !metadata.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return false;
        }
        TracingLevel::from_level(*metadata.level()).as_u8()
            <= CURRENT_LEVEL.load(Ordering::Relaxed)
    }
}

/// Tracing levels that can be set at run time
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TracingLevel {
    /// Rejected methods only
    Error,
    /// Skipped properties and ignored members
    Warn,
    /// Batch summaries
    Info,
    /// Correlation, conversion and strategy decisions
    Debug,
    /// Cache hits and member classification
    Trace,
}

impl TracingLevel {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
            Self::Trace => 4,
        }
    }

    const fn from_level(level: Level) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG => Self::Debug,
            Level::TRACE => Self::Trace,
        }
    }

    /// Install a file subscriber writing to [`Self::get_trace_log_path`]
    ///
    /// The initial level comes from `MAPGEN_LOG` when it names a level. Fails when a global
    /// subscriber is already installed.
    pub fn init_file_tracing() -> Result<PathBuf> {
        let log_path = Self::get_trace_log_path();

        if let Some(level) = std::env::var(LEVEL_ENV_VAR)
            .ok()
            .and_then(|value| value.parse::<Self>().ok())
        {
            Self::set_tracing_level(level);
        }

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(LazyFileWriter::new(log_path.clone()))
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        Registry::default()
            .with(DynamicFilter)
            .with(file_layer)
            .try_init()
            .map_err(|e| Report::new(Error::invalid_config("tracing subscriber", e)))?;

        // Nothing is logged here, so the file stays absent until a real event arrives
        Ok(log_path)
    }

    /// Get the current tracing level
    pub fn get_current_tracing_level() -> Self {
        match CURRENT_LEVEL.load(Ordering::Relaxed) {
            0 => Self::Error,
            2 => Self::Info,
            3 => Self::Debug,
            4 => Self::Trace,
            _ => Self::Warn,
        }
    }

    /// Set the current tracing level
    pub fn set_tracing_level(level: Self) {
        CURRENT_LEVEL.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Get the path to the trace log file
    pub fn get_trace_log_path() -> PathBuf {
        std::env::temp_dir().join(TRACE_LOG_FILE_NAME)
    }
}
