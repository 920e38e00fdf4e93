//! BioProvision CLI Entry Point
//!
//! Runs the full provisioning pipeline on the current machine.
//!
//! # Usage
//!
//! ```bash
//! # Provision with the built-in defaults (or ./provision.yaml)
//! bioprovision
//!
//! # Use a specific configuration file
//! bioprovision --config my-pipeline.yaml
//!
//! # Show diagnostic output
//! bioprovision --verbose
//! ```

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{debug, info};

use bioprovision::config::ProvisionConfig;
use bioprovision::environment::HOST_PLATFORM;
use bioprovision::provision::{print_report, Context, Orchestrator};
use bioprovision::steps::standard_steps;
use bioprovision::{APP_NAME, VERSION};

/// Command-line options parsed from arguments.
#[derive(Debug, Default)]
struct Options {
    config_path: Option<PathBuf>,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Pipeline Dependency Provisioner");
    println!();
}

fn print_usage() {
    println!("Usage: bioprovision [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config PATH   Configuration file (default: ./provision.yaml, then built-in)");
    println!("  --verbose, -v   Enable debug logging");
    println!("  --help, -h      Show this help message");
    println!("  --version, -V   Show version information");
    println!();
    println!("Every step checks whether its work is already done, so running");
    println!("bioprovision again after a partial run is safe.");
}

fn parse_arguments(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--verbose" | "-v" => {
                options.verbose = true;
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("--config requires a path argument".to_string());
                }
                options.config_path = Some(PathBuf::from(&args[i]));
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => {
                return Err(format!("Unexpected argument: {}", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Runs the pipeline and returns the process exit code.
fn run() -> Result<u8, Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let options = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(options.verbose);
    print_banner();

    let working_dir = env::current_dir()?;
    let config = ProvisionConfig::load(options.config_path.as_deref(), &working_dir)?;
    info!("Pipeline: {} ({})", config.pipeline.name, config.pipeline.repository);
    debug!("Host platform: {} [{}]", *HOST_PLATFORM, HOST_PLATFORM.description);

    let context = Context::from_process(config)?;
    let mut orchestrator = Orchestrator::new(context);

    let state = orchestrator.run(&standard_steps());
    print_report(orchestrator.context(), &state);

    Ok(state.exit_code())
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
