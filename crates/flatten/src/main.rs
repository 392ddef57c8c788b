mod cli;

use clap::Parser;
use console::style;
use flatten_lib::FlattenError;

fn main() {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbose, cli.quiet);

    let code = match cli::run::handle_flatten_command(&cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("\n{} {}", style("Error:").red().bold(), e);
            if matches!(e, FlattenError::TargetExists(_)) {
                eprintln!(
                    "{}",
                    style("Rerun with `--overwrite` to copy into the existing folder.").dim()
                );
            }
            e.exit_code()
        }
    };

    std::process::exit(code);
}
