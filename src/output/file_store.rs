//! Batched JSON file output

use crate::output::traits::{DataEntry, DataStore, OutputResult};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes records as JSON arrays, `batch_size` records per file
///
/// Files are named `data-<UTC timestamp>.json` and land in `data_path`, which
/// is created if missing.
#[derive(Debug)]
pub struct FileDataStore {
    data_path: PathBuf,
    batch_size: usize,
    buffer: Vec<DataEntry>,
    written: Vec<PathBuf>,
}

impl FileDataStore {
    pub fn new(data_path: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            data_path: data_path.into(),
            batch_size: batch_size.max(1),
            buffer: Vec::new(),
            written: Vec::new(),
        }
    }

    /// Files written so far, oldest first
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }

    /// Records waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn next_file_path(&self) -> PathBuf {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3fZ").to_string();
        unique_path(&self.data_path, &stamp)
    }

    fn flush(&mut self) -> OutputResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.data_path)?;
        let path = self.next_file_path();
        tracing::info!(
            "Saving {} entries into JSON file: {}",
            self.buffer.len(),
            path.display()
        );

        let json = serde_json::to_vec(&self.buffer)?;
        fs::write(&path, json)?;

        self.buffer.clear();
        self.written.push(path);
        Ok(())
    }
}

/// Picks `data-<stamp>.json`, adding a counter if that name is taken
fn unique_path(dir: &Path, stamp: &str) -> PathBuf {
    let mut path = dir.join(format!("data-{}.json", stamp));
    let mut counter = 1;
    while path.exists() {
        path = dir.join(format!("data-{}-{}.json", stamp, counter));
        counter += 1;
    }
    path
}

impl DataStore for FileDataStore {
    fn before_crawl(&mut self) -> OutputResult<()> {
        self.buffer.clear();
        fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    fn add_data(&mut self, entry: DataEntry) -> OutputResult<()> {
        tracing::debug!("Adding crawled entry to data: {}", entry.url);
        self.buffer.push(entry);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn after_crawl(&mut self) -> OutputResult<()> {
        self.flush()
    }
}
