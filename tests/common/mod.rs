#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use folderzip::{CancellationToken, ProgressSink};
use walkdir::WalkDir;

/// Write `size` bytes of a repeating pattern at `rel` below `dir`.
pub fn create_dummy_file(dir: &Path, rel: &str, size: usize) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let data: Vec<u8> = (0..size).map(|i| (i % 253) as u8).collect();
    fs::write(&path, data).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), size as u64);
}

/// Relative path -> file contents (`None` for directories).
pub fn snapshot(dir: &Path) -> BTreeMap<String, Option<Vec<u8>>> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(dir)
                .unwrap()
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            let contents = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (rel, contents)
        })
        .collect()
}

pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

/// Records every reported fraction.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<f64>>);

impl Recorder {
    pub fn reports(&self) -> Vec<f64> {
        self.0.lock().unwrap().clone()
    }
}

impl ProgressSink for Recorder {
    fn report(&self, fraction: f64) {
        self.0.lock().unwrap().push(fraction);
    }
}

/// Cancels the token once `after` reports have arrived.
pub struct CancelAfter {
    after: usize,
    count: AtomicUsize,
    token: CancellationToken,
}

impl CancelAfter {
    pub fn new(after: usize, token: CancellationToken) -> Self {
        Self {
            after,
            count: AtomicUsize::new(0),
            token,
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl ProgressSink for CancelAfter {
    fn report(&self, _fraction: f64) {
        if self.count.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.token.cancel();
        }
    }
}
