//! Lifetime analysis of a measurement file
//!
//! ```bash
//! cargo run --release --example lifetime_fit -- lifetime.txt
//! cargo run --release --example lifetime_fit -- lifetime.txt --size 5000 --sweep --json
//! cargo run --release --example lifetime_fit -- --schema
//! ```

use clap::Parser;
use decay_lifetime::{LifetimeAnalysis, SizeSweep, read_measurements_from_path};
use std::path::PathBuf;

/// Fit the mean lifetime of decay-time measurements
#[derive(Parser, Debug)]
#[clap(name = "lifetime_fit", version)]
struct Args {
    /// Text file with one `time uncertainty` pair per line
    #[clap(value_parser, required_unless_present = "schema")]
    path: Option<PathBuf>,

    /// Read only the first SIZE measurements
    #[clap(short, long, value_parser)]
    size: Option<usize>,

    /// JSON file with the analysis configuration, missing fields take default values
    #[clap(short, long, value_parser)]
    config: Option<PathBuf>,

    /// Study the lifetime error against the number of measurements
    #[clap(long, value_parser)]
    sweep: bool,

    /// Print the report as JSON
    #[clap(long, value_parser)]
    json: bool,

    /// Print JSON schema of the configuration and exit
    #[clap(long, value_parser)]
    schema: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.schema {
        let schema = schemars::schema_for!(LifetimeAnalysis);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let mut analysis: LifetimeAnalysis = match &args.config {
        Some(path) => serde_json::from_reader(std::fs::File::open(path)?)?,
        None => LifetimeAnalysis::default(),
    };

    let path = args.path.ok_or("measurement file is required")?;
    let data = read_measurements_from_path(&path, args.size)?;

    if args.sweep && analysis.sweep.is_none() {
        let upper = usize::min(SizeSweep::default_upper(), data.len());
        analysis.sweep = Some(SizeSweep::from_range(
            SizeSweep::default_lower().min(upper),
            upper,
            SizeSweep::default_step(),
        ));
    }

    let report = analysis.run(&data)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}
