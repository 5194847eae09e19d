//! Rolling Logger
//!
//! Size-capped rolling log files with an in-memory circular buffer of the
//! most recent lines. `log` records are bridged into tracing, so crates using
//! either facade end up in the same files.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing_subscriber::fmt::MakeWriter;

/// Default size of a single log file before it is rotated
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
/// Default number of files kept (current + rotated)
pub const DEFAULT_MAX_FILES: usize = 5;
/// Default number of lines kept in memory
pub const DEFAULT_RECENT_LINES: usize = 500;

static GLOBAL: OnceLock<RollingFileWriter> = OnceLock::new();

struct RollingState {
    dir: PathBuf,
    base_name: String,
    max_bytes: u64,
    max_files: usize,
    file: Option<File>,
    written: u64,
    recent: VecDeque<String>,
    recent_capacity: usize,
    partial_line: String,
}

impl RollingState {
    fn file_path(&self, index: usize) -> PathBuf {
        if index == 0 {
            self.dir.join(format!("{}.log", self.base_name))
        } else {
            self.dir.join(format!("{}.{}.log", self.base_name, index))
        }
    }

    fn open_current(&mut self) -> io::Result<()> {
        let path = self.file_path(0);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.written = file.metadata().map(|m| m.len()).unwrap_or(0);
        if self.written == 0 {
            let header = format!(
                "=== {} log opened {} ===\n",
                self.base_name,
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
            );
            file.write_all(header.as_bytes())?;
            self.written = header.len() as u64;
        }
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;
        let oldest = self.file_path(self.max_files.saturating_sub(1));
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for index in (0..self.max_files.saturating_sub(1)).rev() {
            let from = self.file_path(index);
            if from.exists() {
                fs::rename(&from, self.file_path(index + 1))?;
            }
        }
        self.open_current()
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.recent_capacity == 0 {
            return;
        }
        self.partial_line.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial_line.find('\n') {
            let line: String = self.partial_line.drain(..=pos).collect();
            if self.recent.len() == self.recent_capacity {
                self.recent.pop_front();
            }
            self.recent.push_back(line.trim_end().to_string());
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        if self.file.is_none() {
            self.open_current()?;
        }
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        self.written += buf.len() as u64;
        self.remember(buf);
        Ok(buf.len())
    }
}

/// Writer handle shared between the tracing subscriber and callers
///
/// Cloning is cheap; all clones append to the same rolling file set.
#[derive(Clone)]
pub struct RollingFileWriter {
    inner: Arc<Mutex<RollingState>>,
}

impl RollingFileWriter {
    /// Create a writer with default limits
    pub fn new(dir: impl AsRef<Path>, base_name: &str) -> io::Result<Self> {
        Self::with_limits(dir, base_name, DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES, DEFAULT_RECENT_LINES)
    }

    /// Create a writer with explicit rotation and buffer limits
    pub fn with_limits(
        dir: impl AsRef<Path>,
        base_name: &str,
        max_bytes: u64,
        max_files: usize,
        recent_capacity: usize,
    ) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let mut state = RollingState {
            dir,
            base_name: base_name.to_string(),
            max_bytes: max_bytes.max(1),
            max_files: max_files.max(1),
            file: None,
            written: 0,
            recent: VecDeque::with_capacity(recent_capacity),
            recent_capacity,
            partial_line: String::new(),
        };
        state.open_current()?;
        Ok(Self {
            inner: Arc::new(Mutex::new(state)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, RollingState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Most recent complete lines, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        self.lock().recent.iter().cloned().collect()
    }

    /// Path of the file currently being written
    pub fn current_path(&self) -> PathBuf {
        self.lock().file_path(0)
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingFileWriter {
    type Writer = RollingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Initialize the global logger writing to `log_dir/<app_name>.log`
pub fn init_logger(log_dir: PathBuf, app_name: &str) -> Result<(), String> {
    let writer = RollingFileWriter::new(&log_dir, app_name)
        .map_err(|e| format!("Failed to open log dir {}: {}", log_dir.display(), e))?;

    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| format!("Failed to install subscriber: {}", e))?;

    GLOBAL
        .set(writer)
        .map_err(|_| "Logger already initialized".to_string())
}

fn ensure_initialized() -> Result<(), String> {
    if GLOBAL.get().is_some() {
        Ok(())
    } else {
        Err("Logger not initialized".to_string())
    }
}

pub fn info(message: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::info!("{}", message);
    Ok(())
}

pub fn warn(message: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::warn!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), String> {
    ensure_initialized()?;
    tracing::error!("{}", message);
    Ok(())
}

/// Recent lines of the global logger (empty before `init_logger`)
pub fn recent_lines() -> Vec<String> {
    GLOBAL.get().map(|w| w.recent_lines()).unwrap_or_default()
}
