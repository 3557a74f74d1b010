use std::f64::consts::TAU;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use gravtab::fields::FIELD_TIDE_BPS;
use gravtab::header::FORMAT_VERSION;
use gravtab::meta::{self, MetaFile, META_FILENAME};
use gravtab::provider::{TIDE_FORCE_MAX, TIDE_FORCE_MIN};
use gravtab::table::{Table, NANOS_PER_SEC};
use gravtab::writer::{Sample, TableBuilder};

#[derive(Parser)]
#[command(name = "gravtab-cli")]
#[command(about = "Inspect, query, and generate GTAB tide tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print header, record layout, and coverage for a table
    Info {
        /// Path to a GTAB file
        table: PathBuf,
    },
    /// Interpolated tide lookup at a unix timestamp
    Lookup {
        /// Path to a GTAB file
        table: PathBuf,

        /// Query instant as unix seconds
        #[arg(long)]
        at: i64,
    },
    /// Generate a synthetic table plus sidecar metadata
    Gen {
        /// Output directory
        #[arg(long)]
        out: PathBuf,

        /// Table epoch as unix seconds
        #[arg(long, default_value_t = 0)]
        epoch: i64,

        /// Sampling interval in seconds
        #[arg(long, default_value_t = 1)]
        interval_secs: i64,

        /// Number of samples
        #[arg(long, default_value_t = 3600)]
        count: u32,

        /// Sinusoid period in samples
        #[arg(long, default_value_t = 720)]
        period: u32,

        /// Dataset identifier recorded in the sidecar metadata
        #[arg(long, default_value = "synthetic")]
        dataset_id: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { table } => {
            let table = Table::open(&table)?;
            let header = table.header();
            let (start_ns, end_ns) = table.coverage();
            println!("epoch_sec:   {}", header.epoch_sec);
            println!("interval_ns: {}", header.interval_ns);
            println!("count:       {}", header.count);
            println!("fields_mask: {:#x}", header.fields_mask);
            println!("record_size: {}", table.layout().record_size());
            for &(kind, offset) in table.layout().present() {
                println!("  {kind:?} @ {offset}");
            }
            println!(
                "coverage:    [{}, {}] (unix seconds)",
                start_ns / NANOS_PER_SEC,
                end_ns / NANOS_PER_SEC
            );
        }
        Commands::Lookup { table, at } => {
            let table = Table::open(&table)?;
            let Some(at_ns) = at.checked_mul(NANOS_PER_SEC) else {
                bail!("timestamp out of range: {at}");
            };
            match table.lookup_tide_bps(at_ns) {
                Some(bps) => {
                    let force =
                        TIDE_FORCE_MIN + f64::from(bps) / 10_000.0 * (TIDE_FORCE_MAX - TIDE_FORCE_MIN);
                    println!("tide_bps: {bps}");
                    println!("lunar_tide_force: {force:.3}");
                }
                None => {
                    let (start_ns, end_ns) = table.coverage();
                    bail!(
                        "no value at {at}: coverage is [{}, {}]",
                        start_ns / NANOS_PER_SEC,
                        end_ns / NANOS_PER_SEC
                    );
                }
            }
        }
        Commands::Gen {
            out,
            epoch,
            interval_secs,
            count,
            period,
            dataset_id,
        } => {
            if interval_secs <= 0 {
                bail!("interval must be positive, got {interval_secs}");
            }
            if count == 0 {
                bail!("count must be positive");
            }
            std::fs::create_dir_all(&out)?;

            // Deterministic sinusoid centered on 5000 bps, spanning the full
            // normalized range like the real generator's percentile mapping.
            let period = period.max(1);
            let mut builder = TableBuilder::new(epoch, interval_secs * NANOS_PER_SEC, FIELD_TIDE_BPS);
            for k in 0..count {
                let phase = f64::from(k % period) / f64::from(period) * TAU;
                let bps = (5_000.0 + 5_000.0 * phase.sin()).round().clamp(0.0, 10_000.0);
                builder.push(Sample::bps(bps as u16));
            }
            let table_path = out.join(format!("gtab_{interval_secs}s.bin"));
            builder.write_to(&table_path)?;

            let meta = MetaFile {
                dataset_id: Some(dataset_id),
                fields_mask: Some(FIELD_TIDE_BPS),
                version: Some(u32::from(FORMAT_VERSION)),
                ..MetaFile::default()
            };
            meta::write_meta(&out.join(META_FILENAME), &meta)?;
            println!("wrote {}", table_path.display());
        }
    }

    Ok(())
}
