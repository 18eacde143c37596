use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use assembly_tracker::config::ConfigLoader;
use assembly_tracker::datasets::DatasetsHttpClient;
use assembly_tracker::error::TrackerError;
use assembly_tracker::output::{JsonOutput, print_sync_summary};
use assembly_tracker::pipeline::{self, SyncOptions, SyncRunner};

#[derive(Parser)]
#[command(name = "asm-track")]
#[command(about = "Track NCBI genome assemblies for a taxon/project intersection in a TSV matrix")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Query upstream and append new assemblies to the matrix")]
    Sync(SyncArgs),
    #[command(about = "Show matrix row count and last tracked accession")]
    Status,
}

#[derive(Args, Clone)]
struct SyncArgs {
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(tracker) = report.downcast_ref::<TrackerError>() {
            return ExitCode::from(map_exit_code(tracker));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TrackerError) -> u8 {
    match error {
        TrackerError::MissingConfig
        | TrackerError::ConfigRead(_)
        | TrackerError::ConfigParse(_)
        | TrackerError::InvalidTaxonId(_)
        | TrackerError::InvalidProjectAccession(_)
        | TrackerError::UnknownField(_)
        | TrackerError::KeyIndexOutOfBounds { .. }
        | TrackerError::KeyFieldMismatch { .. } => 2,
        TrackerError::DatasetsHttp(_)
        | TrackerError::DatasetsStatus { .. }
        | TrackerError::DatasetsPayload(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;

    match cli.command.unwrap_or(Commands::Sync(SyncArgs { dry_run: false })) {
        Commands::Sync(args) => {
            let client = DatasetsHttpClient::new().into_diagnostic()?;
            let runner = SyncRunner::new(client);
            let options = SyncOptions {
                dry_run: args.dry_run,
            };
            let report = runner.run(&config, &options).into_diagnostic()?;
            if cli.non_interactive {
                JsonOutput::print_sync(&report).into_diagnostic()?;
            } else {
                print_sync_summary(&report);
            }
            Ok(())
        }
        Commands::Status => {
            let report = pipeline::status(&config).into_diagnostic()?;
            if cli.non_interactive {
                JsonOutput::print_status(&report).into_diagnostic()?;
            } else {
                println!(
                    "{}: {} row(s), last accession {}",
                    report.matrix_path,
                    report.rows,
                    report.last_key.as_deref().unwrap_or("<none>")
                );
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_problems_exit_with_code_2() {
        let errors = [
            TrackerError::MissingConfig,
            TrackerError::InvalidTaxonId("eukaryota".to_string()),
            TrackerError::InvalidProjectAccession("".to_string()),
            TrackerError::UnknownField("karyotype".to_string()),
            TrackerError::KeyIndexOutOfBounds { index: 5, count: 2 },
            TrackerError::KeyFieldMismatch {
                index: 0,
                found: "organism-name".to_string(),
            },
        ];
        for error in errors {
            assert_eq!(map_exit_code(&error), 2, "{error}");
        }
    }

    #[test]
    fn upstream_problems_exit_with_code_3() {
        let error = TrackerError::DatasetsStatus {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(map_exit_code(&error), 3);
        assert_eq!(
            map_exit_code(&TrackerError::Filesystem("disk full".to_string())),
            1
        );
    }
}
