use clap::Parser;
use std::process;
use video_organizer::cli::{Cli, run_cli};
use video_organizer::logging;
use video_organizer::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    if let Err(e) = run_cli(&cli) {
        OutputFormatter::error(&e.to_string());
        process::exit(1);
    }
}
