use super::Cli;
use chrono::Local;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use flatten_lib::util::{create_progress_bar, format_bytes, format_duration, format_timestamp};
use flatten_lib::{FlattenEngine, Result, RunOutcome, RunState, Settings};
use indicatif::ProgressBar;

pub fn handle_flatten_command(cli: &Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let config = cli.to_config(&settings);

    if !cli.quiet {
        println!(
            "{} {} from {}...",
            style(">>>").cyan(),
            if config.dry_run { "Planning copy" } else { "Copying" },
            style(config.source.display()).bold()
        );
    }

    let progress = if cli.quiet || config.dry_run {
        ProgressBar::hidden()
    } else {
        create_progress_bar(0, "Copying files")
    };

    let outcome = FlattenEngine::new(config).with_progress(progress).run()?;

    if !cli.quiet {
        print_summary(&outcome, cli.verbose);
    }
    if !outcome.failures.is_empty() {
        print_failures(&outcome);
    }

    outcome.into_result().map(|_| ())
}

fn print_summary(outcome: &RunOutcome, verbose: bool) {
    match outcome.state() {
        RunState::DryRun => {
            println!(
                "\n{} Would copy {} files into {}",
                style("✓").green(),
                style(outcome.planned.len()).cyan(),
                style(outcome.target.display()).bold()
            );
            for task in &outcome.planned {
                println!(
                    "  {} {} {}",
                    task.source.display(),
                    style("->").dim(),
                    task.destination.display()
                );
            }
        }
        RunState::Completed(count) | RunState::CompletedWithCleanup(count) => {
            println!("\n{} Finish {} files copy!", style("✓").green(), style(count).cyan());
            println!("  Check them in {}", style(outcome.target.display()).bold());
            println!("  Total size: {}", style(format_bytes(outcome.bytes_copied)).cyan());
        }
        RunState::Failed { copied, failed } => {
            println!(
                "\n{} Copied {} files, {} failed",
                style("!").red(),
                style(copied).cyan(),
                style(failed).red()
            );
            println!("  Target: {}", style(outcome.target.display()).bold());
            println!(
                "  Source folder {} was kept",
                style(outcome.source.display()).dim()
            );
        }
    }

    if outcome.cleaned_up {
        println!(
            "  Source folder {} has been removed",
            style(outcome.source.display()).dim()
        );
    }
    if let Some(err) = &outcome.cleanup_error {
        println!(
            "  {} Could not remove source folder: {}",
            style("!").yellow(),
            err
        );
    }

    if verbose && !outcome.dry_run {
        for task in &outcome.planned {
            println!(
                "  {} {} {}",
                style(task.source.display()).dim(),
                style("->").dim(),
                task.destination.display()
            );
        }
    }

    println!(
        "  Total time: {} (finished {})",
        style(format_duration(outcome.elapsed)).cyan(),
        format_timestamp(&Local::now())
    );
}

fn print_failures(outcome: &RunOutcome) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Source").fg(Color::Cyan),
        Cell::new("Destination").fg(Color::Cyan),
        Cell::new("Stage").fg(Color::Cyan),
        Cell::new("Error").fg(Color::Cyan),
    ]);

    for failure in &outcome.failures {
        table.add_row(vec![
            Cell::new(failure.source_path.display()),
            Cell::new(failure.destination.display()),
            Cell::new(failure.stage),
            Cell::new(&failure.error).fg(Color::Red),
        ]);
    }

    eprintln!("{table}");
}
