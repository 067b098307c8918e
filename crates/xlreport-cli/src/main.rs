//! xlreport CLI - Batch spreadsheet report exporter
//!
//! Runs the task dispatcher, exports single reports and inspects the
//! configured environment.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod exit;

use exit::ExitCode;

#[derive(Parser)]
#[command(name = "xlreport")]
#[command(author, version, about = "Batch spreadsheet report exporter", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "XLREPORT_CONFIG",
        default_value = "config/xlreport.toml"
    )]
    config: PathBuf,

    /// Environment section to use instead of `environment.current`
    #[arg(short, long, global = true, env = "XLREPORT_ENV")]
    env: Option<String>,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every Open task once
    Run {
        /// Print the batch summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export one report directly
    Export {
        /// Template id of the report
        #[arg(short, long, value_name = "ID")]
        template: u32,

        /// Filter parameter, repeatable
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = commands::parse_param)]
        params: Vec<(String, String)>,

        /// Write here instead of the environment's export directory
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Freeze the table header row
        #[arg(long)]
        freeze_header: bool,
    },

    /// List the registered report templates
    Templates {
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config {
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let env = cli.env.as_deref();
    let result = match cli.command {
        Commands::Run { json } => commands::run(&cli.config, env, json),
        Commands::Export {
            template,
            params,
            output_dir,
            freeze_header,
        } => commands::export(&cli.config, env, template, params, output_dir, freeze_header),
        Commands::Templates { json } => commands::templates(json),
        Commands::Config { json } => commands::show_config(&cli.config, env, json),
    };

    match result {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from_error(&e).into()
        }
    }
}
