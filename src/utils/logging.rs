use env_logger::Builder;
use log::{debug, error, info};
use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Once;
use chrono::{Local, Utc};

static INIT: Once = Once::new();

// Keep only the newest log files
const MAX_LOG_FILES: usize = 10;

/// Initialize the logging system. `level` takes env_logger filter syntax,
/// e.g. `debug` or `info,actix_web=warn`.
pub fn init_logger(level: &str) {
    INIT.call_once(|| {
        let log_dir = get_log_dir();
        let log_file = get_log_file_path(&log_dir);

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
        {
            Ok(file) => {
                let mut builder = filtered_builder(level);
                builder
                    .format(|buf, record| {
                        writeln!(
                            buf,
                            "{} [{}] - {}: {}",
                            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                            record.level(),
                            record.target(),
                            record.args()
                        )
                    })
                    .target(env_logger::Target::Pipe(Box::new(FileAndStdout { file })))
                    .init();

                info!("Logging initialized: {}", log_file.display());
                debug!("Log level: {}", level);
                info!(
                    "Payment biometrics starting at {}",
                    Utc::now().format("%Y-%m-%d %H:%M:%S")
                );
            }
            Err(e) => {
                eprintln!("Failed to open log file: {}", e);

                // Fall back to stdout only
                let mut builder = filtered_builder(level);
                builder
                    .format(|buf, record| {
                        writeln!(
                            buf,
                            "{} [{}] - {}: {}",
                            Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                            record.level(),
                            record.target(),
                            record.args()
                        )
                    })
                    .init();

                error!("Failed to open log file, logging to stdout only: {}", e);
            }
        }

        if let Err(e) = clean_old_logs(&log_dir) {
            error!("Failed to clean old logs: {}", e);
        }
    });
}

/// Get the log directory path, creating it if needed
fn get_log_dir() -> PathBuf {
    let path = env::var("LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("logs"));

    if !path.exists() {
        if let Err(e) = fs::create_dir_all(&path) {
            eprintln!("Failed to create log directory: {}", e);
        }
    }

    path
}

/// Get the log file path for the current run
fn get_log_file_path(log_dir: &Path) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    log_dir.join(format!("biometrics_{}.log", timestamp))
}

fn filtered_builder(level: &str) -> Builder {
    let mut builder = Builder::new();
    if level.trim().is_empty() {
        builder.parse_filters("info");
    } else {
        builder.parse_filters(level);
    }
    builder
}

/// Remove all but the newest `MAX_LOG_FILES` log files
fn clean_old_logs(log_dir: &Path) -> std::io::Result<()> {
    let mut log_files = Vec::new();

    for entry in fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && path.extension().map_or(false, |ext| ext == "log") {
            let modified = entry.metadata()?.modified()?;
            log_files.push((modified, path));
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.0.cmp(&a.0));

    for (_, file) in log_files.iter().skip(MAX_LOG_FILES) {
        debug!("Removing old log file: {}", file.display());
        fs::remove_file(file)?;
    }

    Ok(())
}

/// Custom writer that writes to both a file and stdout
struct FileAndStdout {
    file: File,
}

impl Write for FileAndStdout {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stdout().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stdout().flush()?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use log::LevelFilter;

    #[test]
    fn test_configured_level_filters() {
        assert_eq!(filtered_builder("debug").build().filter(), LevelFilter::Debug);
        assert_eq!(filtered_builder("warn").build().filter(), LevelFilter::Warn);
        assert_eq!(filtered_builder("").build().filter(), LevelFilter::Info);
    }

    #[test]
    fn test_clean_old_logs_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..(MAX_LOG_FILES + 3) {
            let path = dir.path().join(format!("biometrics_{:02}.log", i));
            fs::write(&path, b"entry").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        clean_old_logs(dir.path()).unwrap();

        let logs = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |ext| ext == "log"))
            .count();
        assert_eq!(logs, MAX_LOG_FILES);
        assert!(dir.path().join("notes.txt").exists());
    }
}
