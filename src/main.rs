//! archi-reports - Archimate model analysis and reporting

mod report_cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archi-reports")]
#[command(about = "Business process coverage reports for Archimate models", version)]
struct Cli {
    #[command(subcommand)]
    command: report_cli::ReportCommands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    report_cli::run(cli.command)
}
