//! Run logging
//!
//! A run writes three log files next to each other: every crate event at
//! debug and above, errors only, and the statistics summary. The subscriber
//! is returned as an explicit [`Dispatch`] so the caller decides its scope;
//! nothing here installs a global default.

use crate::output::STATS_TARGET;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::dispatcher::DefaultGuard;
use tracing::{Dispatch, Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Activity log: every crate event at debug and above
pub const ACTIVITY_LOG: &str = "extraction.log";

/// Failure log: crate errors only
pub const FAILURE_LOG: &str = "extraction_failures.log";

/// Statistics log: the outcome summary
pub const STATS_LOG: &str = "extraction_stats.log";

const CRATE_TARGET: &str = "link_digest";

/// Console filter for a verbosity level
///
/// `quiet` shows errors only; each `-v` lowers the crate's threshold by one
/// level.
pub fn console_filter(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::new("link_digest=info,warn"),
        1 => EnvFilter::new("link_digest=debug,info"),
        2 => EnvFilter::new("link_digest=trace,debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// The log files and subscriber of one run
pub struct RunLogs {
    dispatch: Dispatch,
    log_dir: PathBuf,
}

impl RunLogs {
    /// Opens (appending) the three log files in `log_dir`
    ///
    /// # Arguments
    ///
    /// * `log_dir` - Directory holding the log files; created if missing
    /// * `console` - Filter for stderr output, or `None` for no console output
    pub fn open(log_dir: &Path, console: Option<EnvFilter>) -> io::Result<Self> {
        std::fs::create_dir_all(log_dir)?;

        let activity = file_layer(
            open_append(&log_dir.join(ACTIVITY_LOG))?,
            Targets::new().with_target(CRATE_TARGET, Level::DEBUG),
        );
        let failures = file_layer(
            open_append(&log_dir.join(FAILURE_LOG))?,
            Targets::new().with_target(CRATE_TARGET, Level::ERROR),
        );
        let stats = file_layer(
            open_append(&log_dir.join(STATS_LOG))?,
            Targets::new().with_target(STATS_TARGET, Level::INFO),
        );
        let console = console.map(|filter| {
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_filter(filter)
        });

        let subscriber = Registry::default()
            .with(console)
            .with(activity)
            .with(failures)
            .with(stats);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            log_dir: log_dir.to_path_buf(),
        })
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Makes these logs the default subscriber of the current thread
    ///
    /// The previous default comes back when the guard is dropped.
    pub fn install(&self) -> DefaultGuard {
        tracing::dispatcher::set_default(&self.dispatch)
    }

    pub fn activity_path(&self) -> PathBuf {
        self.log_dir.join(ACTIVITY_LOG)
    }

    pub fn failure_path(&self) -> PathBuf {
        self.log_dir.join(FAILURE_LOG)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.log_dir.join(STATS_LOG)
    }
}

/// Plain-text layer writing the events `filter` lets through to `file`
fn file_layer<S>(file: File, filter: Targets) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
