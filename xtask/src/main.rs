use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for plaza")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run fmt, clippy, tests and doc in that order
    Check,
    /// Check formatting of every crate
    Fmt,
    /// Lint every target with warnings denied
    Clippy,
    /// Run the workspace tests
    Test,
    /// Build rustdoc for workspace crates only
    Doc,
    /// Build the workspace
    Build,
    /// Run the frame composition micro-benchmark in release mode
    Bench,
}

impl Commands {
    fn label(self) -> &'static str {
        match self {
            Commands::Check => "check",
            Commands::Fmt => "fmt",
            Commands::Clippy => "clippy",
            Commands::Test => "test",
            Commands::Doc => "doc",
            Commands::Build => "build",
            Commands::Bench => "bench",
        }
    }

    fn cargo_args(self) -> &'static [&'static str] {
        match self {
            Commands::Check => &[],
            Commands::Fmt => &["fmt", "--all", "--", "--check"],
            Commands::Clippy => &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            Commands::Test => &["test", "--workspace"],
            Commands::Doc => &["doc", "--workspace", "--no-deps"],
            Commands::Build => &["build", "--workspace"],
            Commands::Bench => &["bench", "-p", "plaza-render", "--bench", "bench_compose"],
        }
    }
}

const CHECK_STEPS: [Commands; 4] = [
    Commands::Fmt,
    Commands::Clippy,
    Commands::Test,
    Commands::Doc,
];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            for step in CHECK_STEPS {
                run(step)?;
            }
            println!("==> all checks passed");
        }
        task => run(task)?,
    }

    Ok(())
}

fn run(task: Commands) -> Result<()> {
    let args = task.cargo_args();
    println!("==> cargo {}", args.join(" "));
    let status = Command::new(env_cargo()).args(args).status()?;
    if !status.success() {
        anyhow::bail!("xtask {} failed ({status})", task.label());
    }
    Ok(())
}

/// The cargo that launched us, so toolchain overrides carry through.
fn env_cargo() -> String {
    std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_owned())
}
