//! `formwork` - command-line front end for Formwork form schemas.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Report;
use formwork::{ConfigProvider, FormEngine};
use tracing_subscriber::EnvFilter;

/// Exit code when a command ran but found problems.
const EXIT_PROBLEMS: i32 = 1;
/// Exit code when a command could not run.
const EXIT_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON.
    let filter = if cli.debug {
        EnvFilter::new(
            "formwork=debug,formwork_cli=debug,formwork_fields=debug,formwork_validation=debug,\
             formwork_visibility=debug,formwork_submit=debug,formwork_config=debug",
        )
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = dispatch_command(cli).await;
    std::process::exit(exit_code);
}

async fn dispatch_command(cli: Cli) -> i32 {
    let mut provider = ConfigProvider::new();
    if let Some(path) = &cli.config {
        provider = provider.with_file(path);
    }
    let engine = match FormEngine::from_provider(&provider) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_ERROR;
        }
    };
    tracing::debug!(config = ?engine.config(), "engine ready");
    report_to_exit(run(&engine, cli.command).await)
}

async fn run(engine: &FormEngine, command: Commands) -> anyhow::Result<Report> {
    match command {
        Commands::Check { definition } => commands::check(engine, &definition),
        Commands::Instance { definition, name } => commands::instance(engine, &definition, &name),
        Commands::Migrate {
            instance,
            definition,
            strict,
            preserve_unknown,
        } => commands::migrate(engine, &instance, &definition, strict, preserve_unknown),
        Commands::Visibility { definition, values } => {
            commands::visibility(engine, &definition, &values)
        }
        Commands::Validate { definition, values } => {
            commands::validate(engine, &definition, &values).await
        }
        Commands::Convert {
            value,
            from,
            to,
            dimension,
        } => commands::convert_value(value, &from, &to, dimension),
    }
}

/// Print a report as JSON and turn the result into an exit code.
fn report_to_exit(result: anyhow::Result<Report>) -> i32 {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_ERROR;
        }
    };
    match serde_json::to_string_pretty(&report.output) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_ERROR;
        }
    }
    if report.clean {
        0
    } else {
        EXIT_PROBLEMS
    }
}
