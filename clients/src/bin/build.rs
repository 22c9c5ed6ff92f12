//! `chainform-build`: compiles the reference units and writes their
//! configurations under the output directory.
//!
//! **Outputs:**
//! - `<out>/<unit path>`: one four-space indented JSON document per unit,
//!   e.g. `<out>/test/app`
//!
//! **Usage:**
//! ```text
//! chainform-build [--out <path>] [--unit <uri>]... [--overwrite] [--print]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chainform::{compile_with_diagnostics, config_path, persist, samples, PersistOptions, Persisted, Uri};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Compile and persist unit configurations.
#[derive(Parser)]
#[command(name = "chainform-build", about = "Compile and persist unit configurations")]
struct Args {
    /// Root directory for persisted configurations.
    #[arg(long, default_value = "config")]
    out: PathBuf,

    /// Replace existing configurations that differ.
    #[arg(long)]
    overwrite: bool,

    /// Only build the unit at this URI. May be repeated.
    #[arg(long = "unit")]
    units: Vec<Uri>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Print the compiled documents to stdout instead of persisting them.
    #[arg(long)]
    print: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let catalog = samples::catalog().context("Failed to declare the reference catalog")?;

    for uri in &args.units {
        if !catalog.iter().any(|unit| unit.uri() == Some(uri)) {
            bail!("No unit is declared at {uri}");
        }
    }

    let options = PersistOptions {
        overwrite: args.overwrite,
    };

    let mut built = 0;
    for unit in &catalog {
        let Some(uri) = unit.uri() else {
            continue;
        };
        if !args.units.is_empty() && !args.units.contains(uri) {
            debug!(unit = %uri, "skipped by --unit filter");
            continue;
        }

        let compilation = compile_with_diagnostics(unit.as_ref())
            .with_context(|| format!("Failed to compile {uri}"))?;
        for diagnostic in compilation.diagnostics.warnings() {
            warn!("{diagnostic}");
        }
        let document = compilation.document;

        if args.print {
            let json = serde_json::to_string_pretty(&document)
                .with_context(|| format!("Failed to serialize {uri}"))?;
            println!("{json}");
        } else {
            let path = config_path(&args.out, uri);
            let outcome = persist(&document, &path, options)
                .with_context(|| format!("Failed to persist {uri}"))?;
            let verb = match outcome {
                Persisted::Created => "Written",
                Persisted::Unchanged => "Unchanged",
                Persisted::Overwritten => "Overwritten",
            };
            eprintln!("  {verb}: {}", path.display());
        }
        built += 1;
    }

    eprintln!("Build complete: {built} unit(s).");
    Ok(())
}
