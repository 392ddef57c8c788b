use crate::error::{FlattenError, Result};
use crate::index::FileFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xdg::BaseDirectories;

pub const CONFIG_FILE_NAME: &str = "flatten.toml";
pub const TEMP_ROOT_ENV: &str = "FLATTEN_TMP";
const DEFAULT_TEMP_DIR_NAME: &str = "tmp_flatten";

/// Values read from `flatten.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Worker threads used for copying
    pub max_workers: Option<usize>,
    /// Copy dot-files and descend into dot-directories
    pub include_hidden: bool,
    /// Parent directory of timestamped default targets
    pub temp_root: Option<PathBuf>,
}

impl Settings {
    /// Load settings from an explicit file, or from the XDG config directory.
    ///
    /// A missing XDG file yields the defaults; a missing explicit file is an
    /// error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let found = BaseDirectories::with_prefix("flatten")
            .ok()
            .and_then(|xdg| xdg.find_config_file(CONFIG_FILE_NAME));

        match found {
            Some(path) => {
                log::debug!("Using config file {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FlattenError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| FlattenError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Directory under which default targets are created.
    ///
    /// `$FLATTEN_TMP` wins over the config file, which wins over the system
    /// temp directory.
    pub fn temp_root(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var(TEMP_ROOT_ENV) {
            if !env_path.is_empty() {
                return PathBuf::from(env_path);
            }
        }
        self.temp_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_TEMP_DIR_NAME))
    }
}

/// Everything one flatten run needs, fixed before the run starts.
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    pub source: PathBuf,
    pub target: PathBuf,
    pub filter: FileFilter,
    pub overwrite: bool,
    pub clean_up: bool,
    pub max_workers: usize,
    pub include_hidden: bool,
    pub dry_run: bool,
}

impl FlattenConfig {
    pub fn new<S: Into<PathBuf>, T: Into<PathBuf>>(source: S, target: T) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            filter: FileFilter::All,
            overwrite: false,
            clean_up: false,
            max_workers: default_worker_limit(),
            include_hidden: false,
            dry_run: false,
        }
    }

    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_clean_up(mut self, clean_up: bool) -> Self {
        self.clean_up = clean_up;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Worker count used when none is configured: the CPU count, at most 8.
pub fn default_worker_limit() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, 8)
}

/// `<temp_root>/<unix millis>`, the target used when none is given.
pub fn timestamped_target<P: AsRef<Path>>(temp_root: P) -> PathBuf {
    let millis = chrono::Utc::now().timestamp_millis();
    temp_root.as_ref().join(millis.to_string())
}
