//! Logging and observability
//!
//! Structured logging with `tracing`:
//! - Console output on stderr
//! - Configurable log levels (`RUST_LOG` wins over configuration)
//! - Optional JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use tally::logging::init_logging;
//! use tally::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(rule_set = "cqm_2011", "Generating report");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of report generation
///
/// # Example
///
/// ```no_run
/// use tally::log_report_start;
///
/// log_report_start!("cqm_2011", "outer", "2016-06-01");
/// ```
#[macro_export]
macro_rules! log_report_start {
    ($rule_set:expr, $mode:expr, $target_date:expr) => {
        tracing::info!(
            rule_set = %$rule_set,
            mode = %$mode,
            target_date = %$target_date,
            "Starting report generation"
        );
    };
}

/// Log the completion of report generation
///
/// # Example
///
/// ```no_run
/// use tally::log_report_complete;
/// use std::time::Duration;
///
/// log_report_complete!(12, Duration::from_millis(350));
/// ```
#[macro_export]
macro_rules! log_report_complete {
    ($measures:expr, $duration:expr) => {
        tracing::info!(
            measures = $measures,
            duration_ms = $duration.as_millis() as u64,
            "Report generation completed"
        );
    };
}

/// Log the evaluation of a patient batch
///
/// # Example
///
/// ```no_run
/// use tally::log_batch_evaluated;
///
/// log_batch_evaluated!(3, 100);
/// ```
#[macro_export]
macro_rules! log_batch_evaluated {
    ($batch:expr, $patients:expr) => {
        tracing::debug!(
            batch = $batch,
            patients = $patients,
            "Evaluating patient batch"
        );
    };
}

/// Log a rule that was skipped for the rest of the report
///
/// # Example
///
/// ```no_run
/// use tally::log_rule_skipped;
/// use tally::domain::TallyError;
///
/// let error = TallyError::UnknownRule("rule_missing".to_string());
/// log_rule_skipped!("rule_missing", &error);
/// ```
#[macro_export]
macro_rules! log_rule_skipped {
    ($rule_id:expr, $error:expr) => {
        tracing::warn!(
            rule_id = %$rule_id,
            error = %$error,
            "Skipping rule"
        );
    };
}

#[cfg(test)]
mod tests {
    use crate::domain::TallyError;
    use std::time::Duration;

    #[test]
    fn test_macros_expand() {
        // No subscriber is installed; this only checks the macros expand
        let error = TallyError::UnknownRule("rule_missing".to_string());
        log_report_start!("cqm_2011", "outer", "2016-06-01");
        log_report_complete!(3usize, Duration::from_millis(5));
        log_batch_evaluated!(1usize, 100usize);
        log_rule_skipped!("rule_missing", &error);
    }
}
