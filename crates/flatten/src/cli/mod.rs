pub mod run;

use clap::Parser;
use flatten_lib::config::{default_worker_limit, timestamped_target};
use flatten_lib::{FileFilter, FlattenConfig, Settings};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "flatten")]
#[command(about = "Copy every matching file of a directory tree into one flat folder", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, help = "Source folder to collect files from")]
    pub from: PathBuf,

    #[arg(long, help = "Target folder (created if missing, defaults to a timestamped temp folder)")]
    pub to: Option<PathBuf>,

    #[arg(
        long,
        default_value = "any",
        help = "File type: any, img, av, or an extension such as json"
    )]
    pub suffix: FileFilter,

    #[arg(long = "clean-up", alias = "cleanUp", help = "Remove the source folder after a successful copy")]
    pub clean_up: bool,

    #[arg(long, help = "Copy into the target folder even if it already exists")]
    pub overwrite: bool,

    #[arg(long, short = 'j', help = "Number of files copied in parallel")]
    pub jobs: Option<usize>,

    #[arg(long, help = "Include hidden files and folders")]
    pub hidden: bool,

    #[arg(long, help = "Show what would be copied without writing anything")]
    pub dry_run: bool,

    #[arg(long, help = "Path to a flatten.toml config file")]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'v', help = "Enable verbose output", conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(long, short = 'q', help = "Suppress non-error output")]
    pub quiet: bool,
}

impl Cli {
    /// Merge command line flags over the loaded settings.
    pub fn to_config(&self, settings: &Settings) -> FlattenConfig {
        let target = self
            .to
            .clone()
            .unwrap_or_else(|| timestamped_target(settings.temp_root()));
        let workers = self
            .jobs
            .or(settings.max_workers)
            .unwrap_or_else(default_worker_limit);

        FlattenConfig::new(&self.from, target)
            .with_filter(self.suffix.clone())
            .with_overwrite(self.overwrite)
            .with_clean_up(self.clean_up)
            .with_max_workers(workers)
            .with_include_hidden(self.hidden || settings.include_hidden)
            .with_dry_run(self.dry_run)
    }
}

pub fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
