#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Files of the shared fixture tree: 7 images and 2 json files.
pub const FIXTURE_FILES: &[&str] = &[
    "a.jpg",
    "data/meta.json",
    "data/more/config.JSON",
    "misc/icon.gif",
    "misc/scan.bmp",
    "photos/2019/beach.JPG",
    "photos/2019/cover.png",
    "photos/2020/cover.png",
    "photos/2020/deep/nested/sunset.jpeg",
];

pub const IMAGE_COUNT: usize = 7;
pub const JSON_COUNT: usize = 2;

pub struct TestFixture {
    pub temp_dir: TempDir,
    pub source: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("fixtures");
        for rel in FIXTURE_FILES {
            write_file(&source, rel, format!("content of {}", rel).as_bytes());
        }
        Self { temp_dir, source }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

pub fn write_file(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

pub fn count_files(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}
