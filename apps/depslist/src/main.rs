use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use depslist_graph::Options;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "depslist")]
#[command(about = "Lists every file a set of JavaScript/TypeScript entries depends on", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute the dependency closure of one or more entry files
    List(ListArgs),
    /// Print the import specifiers found in a single file
    Scan {
        /// File to scan
        file: PathBuf,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Entry files, relative to --cwd
    #[arg(required = true)]
    entries: Vec<PathBuf>,

    #[command(flatten)]
    options: Options,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::List(args) => {
            let num_threads = args.options.jobs.unwrap_or_else(rayon::current_num_threads);
            info!(
                "Listing dependencies of {} entries (using {} threads)",
                args.entries.len(),
                num_threads
            );
            debug!("Options: {:?}", args.options);

            let cwd = args.options.working_dir()?;
            let result = depslist_graph::deps_list(&args.entries, &args.options)?;
            let elapsed_ms = start.elapsed().as_millis();

            if args.json {
                serde_json::to_writer_pretty(&mut stdout, &result)?;
                writeln!(stdout)?;
                stdout.flush()?;
                return Ok(());
            }

            depslist_graph::print_deps_list(&mut stdout, &result, &cwd)?;
            writeln!(
                stdout,
                "\n{} Finished in {}ms on {} files (using {} threads).",
                "●".bright_blue(),
                elapsed_ms.to_string().cyan(),
                result.files.len().to_string().cyan(),
                num_threads.to_string().cyan()
            )?;
            stdout.flush()?;

            Ok(())
        }
        Commands::Scan { file } => {
            info!("Scanning {}", file.display());
            let specifiers = depslist_core::specifiers_for(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            depslist_graph::print_specifiers(&mut stdout, &file, &specifiers)?;
            Ok(())
        }
    }
}
