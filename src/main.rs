use clap::Parser;
use episort::cli::{Cli, run_cli};
use episort::output::OutputFormatter;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_cli(cli.path.as_deref()) {
        OutputFormatter::error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
