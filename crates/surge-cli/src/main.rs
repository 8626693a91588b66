//! Surge command-line interface.

mod output;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use surge_solver::Solver;

#[derive(Parser)]
#[command(name = "surge")]
#[command(about = "A pulsed-power transient circuit simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Input deck file
    #[arg(value_name = "DECK")]
    input: PathBuf,

    /// Write the output table here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Smooth each trace with a trailing two-point average before writing
    #[arg(long)]
    smooth: bool,

    /// Downsample the table to at most this many rows
    #[arg(long, value_name = "ROWS")]
    downsample: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read deck: {}", cli.input.display()))?;
    let circuit = surge_deck::compile(&text)
        .with_context(|| format!("failed to compile deck: {}", cli.input.display()))?;

    if cli.verbose {
        println!("Nodes: {}", circuit.node_count());
        println!("Branches: {}", circuit.branches.len());
        println!("Attachments: {}", circuit.attachments.len());
        println!("Probes: {}", circuit.probes.len());
        println!(
            "Steps: {} ({}s at dt = {}s)",
            circuit.steps(),
            circuit.t_end,
            circuit.dt
        );
        println!();
    }

    let mut solver = Solver::new(circuit);
    let mut table = solver.run().context("simulation failed")?;

    if cli.smooth {
        output::smooth(&mut table);
    }
    if let Some(rows) = cli.downsample {
        table = output::downsample(&table, rows);
    }

    match cli.output {
        Some(path) => {
            let file = fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            output::write_table(io::BufWriter::new(file), &table)?;
            if cli.verbose {
                println!("Wrote {} rows to {}", table.len(), path.display());
            }
        }
        None => {
            let stdout = io::stdout();
            output::write_table(stdout.lock(), &table)?;
            io::stdout().flush()?;
        }
    }

    Ok(())
}
