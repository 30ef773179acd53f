//! Development tasks for shallot
//!
//! Run with: cargo xtask <command>

use clap::{Parser, Subcommand};
use std::process::Command;

const FUZZ_TARGETS: &[&str] = &[
    "fuzz_onion_peel",
    "fuzz_wire_message",
    "fuzz_crypto",
    "fuzz_key_codec",
];

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "shallot development tasks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all tests
    Test,

    /// Run clippy lints
    Lint,

    /// Check formatting
    Fmt,

    /// Run all CI checks
    Ci,

    /// Run the criterion benchmarks
    Bench,

    /// Run fuzz targets (requires nightly and cargo-fuzz)
    Fuzz {
        /// Single target to run, all targets if omitted
        target: Option<String>,

        /// Seconds per target
        #[arg(short, long, default_value = "60")]
        seconds: u64,
    },

    /// Generate documentation
    Doc,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Test => {
            run_command("cargo", &["test", "--workspace"])?;
        }
        Commands::Lint => {
            run_command("cargo", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
        }
        Commands::Fmt => {
            run_command("cargo", &["fmt", "--all", "--check"])?;
        }
        Commands::Ci => {
            println!("Running CI checks...");
            run_command("cargo", &["fmt", "--all", "--check"])?;
            run_command("cargo", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            run_command("cargo", &["test", "--workspace"])?;
            println!("All CI checks passed!");
        }
        Commands::Bench => {
            run_command("cargo", &["bench", "-p", "shallot-crypto", "-p", "shallot-core"])?;
        }
        Commands::Fuzz { target, seconds } => {
            let targets: Vec<&str> = match target.as_deref() {
                Some(name) if FUZZ_TARGETS.contains(&name) => vec![name],
                Some(name) => anyhow::bail!("unknown fuzz target {name}, expected one of {FUZZ_TARGETS:?}"),
                None => FUZZ_TARGETS.to_vec(),
            };
            let budget = format!("-max_total_time={seconds}");
            for name in targets {
                println!("Fuzzing {name} for {seconds}s...");
                run_command("cargo", &["+nightly", "fuzz", "run", name, "--", &budget])?;
            }
        }
        Commands::Doc => {
            run_command("cargo", &["doc", "--workspace", "--no-deps", "--open"])?;
        }
    }

    Ok(())
}

fn run_command(program: &str, args: &[&str]) -> anyhow::Result<()> {
    let status = Command::new(program).args(args).status()?;

    if !status.success() {
        anyhow::bail!("{} {:?} failed", program, args);
    }

    Ok(())
}
