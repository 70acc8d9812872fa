use std::sync::OnceLock;

use flexi_logger::{Duplicate, FileSpec, Logger, LoggerHandle};

pub mod normalize_string;
pub mod yaml_format;

pub const EPSILON: f64 = 1e-6;

static LOG_HANDLE: OnceLock<LoggerHandle> = OnceLock::new();

/// Initializes logging once for the whole process. Safe to call from
/// multiple tests; only the first call configures the logger.
pub fn setup_logging(base_level: &str) {
    LOG_HANDLE.get_or_init(|| {
        Logger::try_with_str(base_level)
            .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e))
            .log_to_file(FileSpec::default().directory("logs"))
            .duplicate_to_stderr(Duplicate::Warn)
            .duplicate_to_stdout(Duplicate::All)
            .rotate(
                flexi_logger::Criterion::Size(1024 * 1024), //1MB
                flexi_logger::Naming::Timestamps,
                flexi_logger::Cleanup::KeepLogFiles(5),
            )
            .start()
            .unwrap_or_else(|e| panic!("Logger initialization failed with {}", e))
    });
}
