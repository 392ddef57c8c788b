use crate::config::FlattenConfig;
use crate::error::{CopyError, FlattenError, Result};
use crate::flatten::{copier, resolver::NameReservations, space};
use crate::index::{scanner, FileFilter, ScanOptions};
use indicatif::ProgressBar;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// One source file and the destination reserved for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCopy {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub size_bytes: u64,
}

/// How a run that got past validation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing was written; see [`RunOutcome::planned`].
    DryRun,
    Completed(usize),
    CompletedWithCleanup(usize),
    Failed { copied: usize, failed: usize },
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Source folder as given; cleanup removes this path and not a symlink's target.
    pub source: PathBuf,
    pub target: PathBuf,
    pub filter: FileFilter,
    pub planned: Vec<PlannedCopy>,
    pub copied: usize,
    pub bytes_copied: u64,
    pub failures: Vec<CopyError>,
    pub cleaned_up: bool,
    pub cleanup_error: Option<String>,
    pub dry_run: bool,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn state(&self) -> RunState {
        if self.dry_run {
            RunState::DryRun
        } else if !self.failures.is_empty() {
            RunState::Failed {
                copied: self.copied,
                failed: self.failures.len(),
            }
        } else if self.cleaned_up {
            RunState::CompletedWithCleanup(self.copied)
        } else {
            RunState::Completed(self.copied)
        }
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn a run with failed copies into [`FlattenError::CopyFailures`].
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FlattenError::CopyFailures {
                failed: self.failures.len(),
                total: self.planned.len(),
            })
        }
    }
}

/// Copies every matching file of a source tree into one flat directory.
pub struct FlattenEngine {
    config: FlattenConfig,
    progress: ProgressBar,
}

impl FlattenEngine {
    pub fn new(config: FlattenConfig) -> Self {
        Self {
            config,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report per-file progress on `progress` while copying.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Run the whole flatten operation.
    ///
    /// `Err` means the run was rejected before any file was copied. Failed
    /// copies do not produce `Err`; they are listed in
    /// [`RunOutcome::failures`] and the source is then never removed.
    pub fn run(&self) -> Result<RunOutcome> {
        let started = Instant::now();

        let (source_root, target) = self.validate()?;
        let matcher = self.config.filter.compile()?;
        self.prepare_target(&target)?;

        log::info!(
            "Collecting {}s from {}",
            self.config.filter.describe(),
            source_root.display()
        );
        let scan_options = ScanOptions {
            include_hidden: self.config.include_hidden,
        };
        let candidates = scanner::scan_with_matcher(&source_root, &matcher, &scan_options)?;

        if candidates.is_empty() {
            log::warn!(
                "No {} in folder {}",
                self.config.filter.describe(),
                source_root.display()
            );
        }

        let planned = self.plan(&target, candidates)?;

        let mut outcome = RunOutcome {
            source: self.config.source.clone(),
            target,
            filter: self.config.filter.clone(),
            planned,
            copied: 0,
            bytes_copied: 0,
            failures: Vec::new(),
            cleaned_up: false,
            cleanup_error: None,
            dry_run: self.config.dry_run,
            elapsed: Duration::ZERO,
        };

        if self.config.dry_run {
            for task in &outcome.planned {
                log::info!(
                    "DRY RUN: Would copy {} -> {}",
                    task.source.display(),
                    task.destination.display()
                );
            }
            outcome.elapsed = started.elapsed();
            return Ok(outcome);
        }

        let total_bytes: u64 = outcome.planned.iter().map(|t| t.size_bytes).sum();
        space::warn_if_insufficient(&outcome.target, total_bytes);

        for result in self.copy_all(&outcome.planned) {
            match result {
                Ok(bytes) => {
                    outcome.copied += 1;
                    outcome.bytes_copied += bytes;
                }
                Err(e) => {
                    log::error!("{}", e);
                    outcome.failures.push(e);
                }
            }
        }

        self.finalize(&mut outcome);
        outcome.elapsed = started.elapsed();
        Ok(outcome)
    }

    fn validate(&self) -> Result<(PathBuf, PathBuf)> {
        let source = &self.config.source;
        if !source.exists() {
            return Err(FlattenError::SourceNotFound(source.clone()));
        }
        if !source.is_dir() {
            return Err(FlattenError::SourceNotDirectory(source.clone()));
        }

        let source = fs::canonicalize(source)?;
        let target = absolutize(&self.config.target)?;

        if target.starts_with(&source) {
            return Err(FlattenError::TargetInsideSource {
                source_dir: source,
                target_dir: target,
            });
        }

        Ok((source, target))
    }

    fn prepare_target(&self, target: &Path) -> Result<()> {
        match fs::metadata(target) {
            Ok(meta) if !meta.is_dir() => Err(FlattenError::TargetNotDirectory(target.to_path_buf())),
            Ok(_) if !self.config.overwrite => {
                Err(FlattenError::TargetExists(target.to_path_buf()))
            }
            Ok(_) => {
                log::info!("Copying into existing folder {}", target.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if self.config.dry_run {
                    log::info!("DRY RUN: Would create {}", target.display());
                } else {
                    fs::create_dir_all(target)?;
                    log::info!("Created target folder {}", target.display());
                }
                Ok(())
            }
            Err(e) => Err(FlattenError::Io(e)),
        }
    }

    /// Reserve every destination name before any copy starts.
    ///
    /// With overwrite set, existing files of the same name are replaced in
    /// place; otherwise they count as taken.
    fn plan(&self, target: &Path, candidates: Vec<PathBuf>) -> Result<Vec<PlannedCopy>> {
        let mut names = NameReservations::new(target, !self.config.overwrite);
        let mut planned = Vec::with_capacity(candidates.len());

        for source in candidates {
            let destination = names.reserve(&source)?;
            let size_bytes = fs::metadata(&source).map(|m| m.len()).unwrap_or(0);
            planned.push(PlannedCopy {
                source,
                destination,
                size_bytes,
            });
        }

        Ok(planned)
    }

    fn copy_all(&self, planned: &[PlannedCopy]) -> Vec<std::result::Result<u64, CopyError>> {
        if planned.is_empty() {
            return Vec::new();
        }

        self.progress.set_length(planned.len() as u64);
        let progress = &self.progress;
        let copy_one = |task: &PlannedCopy| {
            let result = copier::copy_file(&task.source, &task.destination);
            progress.inc(1);
            result
        };

        let workers = self.config.max_workers.max(1);
        let results: Vec<_> = if workers == 1 {
            planned.iter().map(copy_one).collect()
        } else {
            match ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("flatten-copy-{}", i))
                .build()
            {
                Ok(pool) => pool.install(|| planned.par_iter().map(copy_one).collect()),
                Err(e) => {
                    log::warn!(
                        "Failed to start thread pool (workers={}): {}; copying serially",
                        workers,
                        e
                    );
                    planned.iter().map(copy_one).collect()
                }
            }
        };

        self.progress.finish_and_clear();
        results
    }

    fn finalize(&self, outcome: &mut RunOutcome) {
        if !outcome.failures.is_empty() {
            if self.config.clean_up {
                log::warn!(
                    "Keeping source folder {}: {} copies failed",
                    outcome.source.display(),
                    outcome.failures.len()
                );
            }
            return;
        }

        if !self.config.clean_up {
            return;
        }

        match fs::remove_dir_all(&outcome.source) {
            Ok(()) => {
                log::info!("Removed source folder {}", outcome.source.display());
                outcome.cleaned_up = true;
            }
            Err(e) => {
                log::error!(
                    "Failed to remove source folder {}: {}",
                    outcome.source.display(),
                    e
                );
                outcome.cleanup_error = Some(e.to_string());
            }
        }
    }
}

/// Absolute form of `path` with every existing ancestor canonicalized.
fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(mut resolved) = existing.canonicalize() {
            for name in tail.iter().rev() {
                resolved.push(name);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_source_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let config = FlattenConfig::new(temp_dir.path().join("nope"), temp_dir.path().join("out"));

        let result = FlattenEngine::new(config).run();
        assert!(matches!(result, Err(FlattenError::SourceNotFound(_))));
        assert!(!temp_dir.path().join("out").exists());
    }

    #[test]
    fn test_source_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = write(temp_dir.path(), "file.txt", b"x");
        let config = FlattenConfig::new(file, temp_dir.path().join("out"));

        let result = FlattenEngine::new(config).run();
        assert!(matches!(result, Err(FlattenError::SourceNotDirectory(_))));
    }

    #[test]
    fn test_target_inside_source_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        write(&source, "a.txt", b"a");
        let config = FlattenConfig::new(&source, source.join("flat"));

        let result = FlattenEngine::new(config).run();
        assert!(matches!(result, Err(FlattenError::TargetInsideSource { .. })));
        assert!(!source.join("flat").exists());
    }

    #[test]
    fn test_target_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        write(&source, "a.txt", b"a");
        let target = write(temp_dir.path(), "out", b"not a dir");
        let config = FlattenConfig::new(&source, &target).with_overwrite(true);

        let result = FlattenEngine::new(config).run();
        assert!(matches!(result, Err(FlattenError::TargetNotDirectory(_))));
    }

    #[test]
    fn test_creates_nested_target() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        write(&source, "x/a.txt", b"a");
        let target = temp_dir.path().join("deep/er/out");

        let outcome = FlattenEngine::new(FlattenConfig::new(&source, &target))
            .run()
            .unwrap();
        assert_eq!(outcome.state(), RunState::Completed(1));
        assert_eq!(fs::read(target.join("a.txt")).unwrap(), b"a");
    }

    #[test]
    fn test_empty_source_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        write(&source, "notes.md", b"n");
        let target = temp_dir.path().join("out");

        let config = FlattenConfig::new(&source, &target).with_filter(FileFilter::Image);
        let outcome = FlattenEngine::new(config).run().unwrap();
        assert_eq!(outcome.state(), RunState::Completed(0));
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        write(&source, "a/pic.jpg", b"1");
        write(&source, "b/pic.jpg", b"2");
        let target = temp_dir.path().join("out");

        let config = FlattenConfig::new(&source, &target)
            .with_dry_run(true)
            .with_clean_up(true);
        let outcome = FlattenEngine::new(config).run().unwrap();

        assert_eq!(outcome.state(), RunState::DryRun);
        assert_eq!(outcome.planned.len(), 2);
        assert_eq!(
            outcome.planned[1].destination.file_name().unwrap(),
            "pic-1.jpg"
        );
        assert!(!target.exists());
        assert!(source.exists());
    }

    #[test]
    fn test_serial_and_parallel_give_same_result() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        for i in 0..20 {
            write(&source, &format!("d{}/same.bin", i), format!("{}", i).as_bytes());
        }

        for workers in [1, 4] {
            let target = temp_dir.path().join(format!("out{}", workers));
            let config = FlattenConfig::new(&source, &target).with_max_workers(workers);
            let outcome = FlattenEngine::new(config).run().unwrap();
            assert_eq!(outcome.state(), RunState::Completed(20));
            for task in &outcome.planned {
                assert_eq!(
                    fs::read(&task.source).unwrap(),
                    fs::read(&task.destination).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_outcome_into_result() {
        let outcome = RunOutcome {
            source: PathBuf::from("/s"),
            target: PathBuf::from("/t"),
            filter: FileFilter::All,
            planned: Vec::new(),
            copied: 2,
            bytes_copied: 10,
            failures: vec![CopyError {
                source_path: PathBuf::from("/s/a"),
                destination: PathBuf::from("/t/a"),
                stage: crate::error::CopyStage::Transfer,
                error: io::Error::new(io::ErrorKind::Other, "boom"),
            }],
            cleaned_up: false,
            cleanup_error: None,
            dry_run: false,
            elapsed: Duration::ZERO,
        };
        assert_eq!(outcome.state(), RunState::Failed { copied: 2, failed: 1 });
        assert!(matches!(
            outcome.into_result(),
            Err(FlattenError::CopyFailures { failed: 1, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_up_through_symlink_removes_only_the_link() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real");
        write(&real, "a/pic.jpg", b"1");
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let target = temp_dir.path().join("out");

        let config = FlattenConfig::new(&link, &target).with_clean_up(true);
        let outcome = FlattenEngine::new(config).run().unwrap();

        assert_eq!(outcome.state(), RunState::CompletedWithCleanup(1));
        assert!(fs::symlink_metadata(&link).is_err());
        assert_eq!(fs::read(real.join("a/pic.jpg")).unwrap(), b"1");
        assert_eq!(fs::read(target.join("pic.jpg")).unwrap(), b"1");
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subfolder_rejects_run() {
        use std::os::unix::fs::PermissionsExt;

        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("src");
        write(&source, "locked/a.jpg", b"1");
        write(&source, "open/b.jpg", b"2");
        let locked = source.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        let target = temp_dir.path().join("out");

        let config = FlattenConfig::new(&source, &target).with_clean_up(true);
        let result = FlattenEngine::new(config).run();

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(FlattenError::Traversal { .. })));
        assert!(source.join("open/b.jpg").exists());
        assert!(!target.join("b.jpg").exists());
    }

    #[test]
    fn test_absolutize_keeps_missing_tail() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().canonicalize().unwrap();
        let resolved = absolutize(&temp_dir.path().join("a/b")).unwrap();
        assert_eq!(resolved, base.join("a").join("b"));
    }
}
