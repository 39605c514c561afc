//! Size-rotated report files.
//!
//! Detail lines go to `<session_dir>/<file_name>.log`, summary lines to
//! `<session_dir>/<file_name>_summary.log`. When a file would grow past
//! `max_file_bytes` it is shifted to `<stem>.1.log`, older generations move
//! up by one and the oldest beyond `max_files` is dropped.

use super::{LineSink, SinkId};
use crate::core::config::SinkConfig;
use crate::core::{FpsError, Result};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Report sink writing to two rotated files in a session directory.
#[derive(Debug)]
pub struct FileSink {
    detail: Mutex<RotatingFile>,
    summary: Mutex<RotatingFile>,
}

impl FileSink {
    /// Create the session directory if needed and open both report files
    /// for appending.
    pub fn open(config: &SinkConfig) -> Result<Self> {
        fs::create_dir_all(&config.session_dir)?;

        let detail = RotatingFile::open(
            &config.session_dir,
            config.file_name.clone(),
            config.max_file_bytes,
            config.max_files,
        )?;
        let summary = RotatingFile::open(
            &config.session_dir,
            format!("{}_summary", config.file_name),
            config.max_file_bytes,
            config.max_files,
        )?;

        tracing::info!(
            "Writing frame-rate reports to {:?} and {:?}",
            detail.path,
            summary.path
        );

        Ok(Self {
            detail: Mutex::new(detail),
            summary: Mutex::new(summary),
        })
    }

    /// Path of the current file for `sink`.
    pub fn path(&self, sink: SinkId) -> PathBuf {
        match sink {
            SinkId::Detail => self.detail.lock().path.clone(),
            SinkId::Summary => self.summary.lock().path.clone(),
        }
    }
}

impl LineSink for FileSink {
    fn write_line(&self, sink: SinkId, text: &str) -> Result<()> {
        match sink {
            SinkId::Detail => self.detail.lock().append(text),
            SinkId::Summary => self.summary.lock().append(text),
        }
    }
}

#[derive(Debug)]
struct RotatingFile {
    dir: PathBuf,
    stem: String,
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    max_files: usize,
}

impl RotatingFile {
    fn open(dir: &Path, stem: String, max_bytes: u64, max_files: usize) -> Result<Self> {
        let path = dir.join(format!("{}.log", stem));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            dir: dir.to_path_buf(),
            stem,
            path,
            file,
            written,
            max_bytes,
            max_files: max_files.max(1),
        })
    }

    fn generation(&self, n: usize) -> PathBuf {
        self.dir.join(format!("{}.{}.log", self.stem, n))
    }

    fn append(&mut self, text: &str) -> Result<()> {
        let len = text.len() as u64 + 1;
        if self.written > 0 && self.written + len > self.max_bytes {
            self.rotate()?;
        }

        self.file
            .write_all(text.as_bytes())
            .and_then(|()| self.file.write_all(b"\n"))
            .and_then(|()| self.file.flush())
            .map_err(|e| FpsError::sink(format!("write to {:?} failed: {}", self.path, e)))?;
        self.written += len;
        Ok(())
    }

    fn rotate(&mut self) -> Result<()> {
        if self.max_files > 1 {
            let oldest = self.generation(self.max_files - 1);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for n in (1..self.max_files - 1).rev() {
                let from = self.generation(n);
                if from.exists() {
                    fs::rename(&from, self.generation(n + 1))?;
                }
            }
            fs::rename(&self.path, self.generation(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        tracing::debug!("Rotated report file {:?}", self.path);
        Ok(())
    }
}
