use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for swarmview")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and doc in that order
    Check,
    /// Check formatting of every crate
    Fmt,
    /// Lint every target with warnings denied
    Clippy,
    /// Run the workspace tests; GPU tests skip themselves without an adapter
    Test,
    /// Build rustdoc for the workspace crates
    Doc,
    /// Run the CPU reference step bench
    Bench,
    /// Render a few offscreen frames through swarm-cli
    Smoke {
        /// Entities to spawn
        #[arg(long, default_value = "10000")]
        entities: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            doc()?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Doc => doc()?,
        Commands::Bench => cargo(&["bench", "-p", "swarm-kernel"])?,
        Commands::Smoke { entities } => {
            let entities = entities.to_string();
            cargo(&[
                "run",
                "-p",
                "swarm-cli",
                "--",
                "run",
                "--entities",
                &entities,
                "--frames",
                "10",
                "--click",
                "0,0",
            ])?;
        }
    }

    Ok(())
}

fn fmt() -> Result<()> {
    cargo(&["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])
}

fn test() -> Result<()> {
    cargo(&["test", "--workspace"])
}

fn doc() -> Result<()> {
    cargo(&["doc", "--workspace", "--no-deps"])
}

/// Run `cargo <args>` and fail if it exits unsuccessfully.
fn cargo(args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}
