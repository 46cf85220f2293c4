use std::path::PathBuf;

use clap::Parser;
use grade_book::config::StoreConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "grade-book")]
#[command(version)]
#[command(about = "Student CGPA store with hall of fame, course offer and department reports", long_about = None)]
struct Cli {
    /// Records file, one `studentId/cgpa` per line
    #[arg(short, long, default_value = "input.txt")]
    input: PathBuf,

    /// Prompt file selecting the reports to produce
    #[arg(short, long, default_value = "prompts.txt")]
    prompts: PathBuf,

    /// Report output file
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// TOML file overriding the store configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Year used for graduation eligibility instead of the current year
    #[arg(long)]
    current_year: Option<u16>,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout)
        .try_init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load(path).unwrap_or_else(|err| {
            warn!(error = %err, "falling back to default configuration");
            StoreConfig::default()
        }),
        None => StoreConfig::default(),
    };
    if cli.current_year.is_some() {
        config.current_year = cli.current_year;
    }

    let store = grade_book::run(config, &cli.input, &cli.prompts, &cli.output);
    info!(records = store.len(), "done");
}
