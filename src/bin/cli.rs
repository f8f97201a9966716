use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hardenscore::config::Config;
use hardenscore::error::ScoreError;
use hardenscore::host::{HostContext, ProgramMode};
use hardenscore::output::OutputFormat;
use hardenscore::Engine;

#[derive(Parser)]
#[command(
    name = "hardenscore",
    about = "Scores a machine against encrypted hardening issue definitions",
    version,
    author
)]
struct Cli {
    /// Config file path
    #[arg(long, short = 'c', global = true, default_value = ".hardenscore.toml")]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scoring sweep and print the result
    Check {
        /// Read sealed definitions (deployed image) instead of plaintext
        #[arg(long)]
        deployed: bool,

        /// Output format (console, json)
        #[arg(long, short = 'f')]
        format: Option<String>,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Check that every plaintext definition parses
    Validate,

    /// Encrypt plaintext definitions for deployment and remove the originals
    Prepare {
        /// Machine the definitions will be deployed to (defaults to this host)
        #[arg(long, env = "HARDENSCORE_MACHINE")]
        machine: Option<String>,
    },

    /// Generate a starter .hardenscore.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check {
            deployed,
            format,
            output,
        } => cmd_check(cli.config, deployed, format, output),
        Commands::Validate => cmd_validate(cli.config),
        Commands::Prepare { machine } => cmd_prepare(cli.config, machine),
        Commands::Init { force } => cmd_init(cli.config, force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_check(
    config_path: PathBuf,
    deployed: bool,
    format_str: Option<String>,
    output_path: Option<PathBuf>,
) -> Result<i32, ScoreError> {
    let config = Config::load(&config_path)?;

    let format = match format_str {
        Some(s) => OutputFormat::from_str_lenient(&s).unwrap_or_else(|| {
            eprintln!("Warning: unknown format '{}', using console", s);
            OutputFormat::Console
        }),
        None => config.report.format,
    };

    let mode = if deployed {
        ProgramMode::Start
    } else {
        ProgramMode::Author
    };
    let host = HostContext::detect(mode);

    let mut engine = Engine::open(&config, &config_path, host)?;
    let report = engine.sweep();
    engine.save_state()?;
    let rendered = hardenscore::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    // Exit code: 0 = nothing lost since the previous check, 1 = points were lost
    Ok(if report.ledger.change_status.lost { 1 } else { 0 })
}

fn cmd_validate(config_path: PathBuf) -> Result<i32, ScoreError> {
    let config = Config::load(&config_path)?;
    let report = hardenscore::validate(&config, &config_path)?;

    for failure in &report.failures {
        println!("  FAIL {}: {}", failure.path.display(), failure.message);
    }
    println!(
        "{} of {} definition file(s) valid",
        report.checked - report.failures.len(),
        report.checked
    );

    Ok(if report.passed() { 0 } else { 1 })
}

fn cmd_prepare(config_path: PathBuf, machine: Option<String>) -> Result<i32, ScoreError> {
    let config = Config::load(&config_path)?;
    let machine = match machine {
        Some(name) => name,
        None => HostContext::detect(ProgramMode::Prepare).machine_name,
    };

    let summary = hardenscore::prepare(&config, &config_path, &machine)?;
    println!(
        "Sealed {} definition file(s) for '{}' ({} empty director{} removed)",
        summary.sealed,
        machine,
        summary.removed_dirs,
        if summary.removed_dirs == 1 { "y" } else { "ies" }
    );

    Ok(0)
}

fn cmd_init(path: PathBuf, force: bool) -> Result<i32, ScoreError> {
    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", path.display());
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {}", path.display());

    Ok(0)
}
