mod driver;

use clap::Parser;
use driver::RunConfig;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "langevitour")]
#[command(about = "Run a Langevin tour headlessly and print the final state")]
#[command(version)]
struct Args {
    /// Dataset JSON (render input, or a raw table with --raw)
    input: PathBuf,

    /// Treat the input as a raw table to be centered and scaled
    #[arg(long)]
    raw: bool,

    /// Number of frames to simulate
    #[arg(short = 'n', long, default_value = "600")]
    steps: usize,

    /// Seconds per frame
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f64,

    /// RNG seed
    #[arg(short, long, default_value = "1")]
    seed: u64,

    /// Initial state as JSON, or @file
    #[arg(long)]
    state: Option<String>,

    /// Guide (none, ultralocal, local, pca, outlier, push, pull)
    #[arg(short, long)]
    guide: Option<String>,

    /// Also write every n-th frame
    #[arg(long, default_value = "0")]
    record_every: usize,

    /// Write JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr so stdout stays clean JSON
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = RunConfig {
        input: args.input,
        raw: args.raw,
        steps: args.steps,
        dt: args.dt,
        seed: args.seed,
        state: args.state,
        guide: args.guide,
        record_every: args.record_every,
    };

    let result = driver::run(&config).and_then(|output| {
        let json = serde_json::to_string_pretty(&output)?;
        match &args.output {
            Some(path) => {
                fs::write(path, json)?;
                info!(path = %path.display(), "wrote output");
            }
            None => println!("{}", json),
        }
        Ok(())
    });

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
