//! modtools - convert mod descriptors between the manifest and build-project formats
//!
//! Main entry point for the command-line tool.
//!
//! # Commands
//!
//! - `modinfo2proj`: `.modinfo` -> `.civ5proj`, plus the `.civ5sln` beside it
//! - `proj2modinfo`: `.civ5proj` -> `.modinfo`, with fresh checksums
//! - `validate`: decode a descriptor and report what it holds
//! - `update-md5`: recompute the checksums in a `.modinfo`
//! - `sync-files`: add untracked files from the mod directory
//! - `show`: print a decoded descriptor as YAML
//!
//! Settings come from `modtools.yaml` in `--config-dir` and `MODTOOLS_*`
//! environment variables. Exit status is 0 on success and 1 on any error.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use modtools::{APP_NAME, ConfigManager, ConversionService, VERSION, logging};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "modtools")]
#[command(about = "Convert mod descriptors between .modinfo and .civ5proj")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding modtools.yaml
    #[arg(long, global = true, default_value = ".")]
    config_dir: Utf8PathBuf,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a .modinfo file to a .civ5proj file
    #[command(name = "modinfo2proj")]
    ModinfoToProj {
        input: Utf8PathBuf,

        /// Requested output path; the file name is derived from the mod name
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,

        /// Do not create or update the .civ5sln
        #[arg(long)]
        no_solution: bool,
    },

    /// Convert a .civ5proj file to a .modinfo file
    #[command(name = "proj2modinfo")]
    ProjToModinfo {
        input: Utf8PathBuf,

        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Check that a .modinfo or .civ5proj file can be read
    Validate { file: Utf8PathBuf },

    /// Recompute MD5 checksums in a .modinfo file
    #[command(name = "update-md5")]
    UpdateMd5 {
        input: Utf8PathBuf,

        /// Write here instead of updating in place
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Add files from the mod directory that the descriptor does not list
    #[command(name = "sync-files")]
    SyncFiles {
        file: Utf8PathBuf,

        /// Mod directory (default: the descriptor's directory)
        #[arg(long)]
        dir: Option<Utf8PathBuf>,

        /// Import new files into the VFS
        #[arg(long)]
        import: bool,
    },

    /// Print a decoded .modinfo or .civ5proj as YAML
    Show { file: Utf8PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir);
    let mut settings = match config_manager.load_settings() {
        Ok(settings) => settings,
        Err(e) => {
            // No subscriber yet
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    if cli.debug {
        settings.logging.debug = true;
    }

    let _guard = match logging::setup_logging(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!("Starting {} v{}", APP_NAME, VERSION);

    let service = ConversionService::new(settings);
    let result = run(&service, cli.command);
    service.metrics().log_summary();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(service: &ConversionService, command: Commands) -> Result<()> {
    match command {
        Commands::ModinfoToProj {
            input,
            output,
            no_solution,
        } => {
            let written =
                service.manifest_to_build_project(&input, output.as_deref(), !no_solution)?;
            println!("{}", written);
        }
        Commands::ProjToModinfo { input, output } => {
            let (written, document) = service.build_project_to_manifest(&input, output.as_deref())?;
            println!(
                "{} ({} checksums, {} unavailable)",
                written,
                document.checksums_computed,
                document.missing_checksums.len()
            );
        }
        Commands::Validate { file } => {
            let (kind, project) = service.validate(&file)?;
            println!("{}: valid {} '{}'", file, kind, project.name);
        }
        Commands::UpdateMd5 { input, output } => {
            let document = service.update_checksums(&input, output.as_deref())?;
            println!("Updated {} checksums", document.checksums_computed);
            for missing in &document.missing_checksums {
                println!("  not found: {}", missing);
            }
        }
        Commands::SyncFiles { file, dir, import } => {
            let report = service.sync_files(&file, dir.as_deref(), import)?;
            for added in &report.added {
                println!("+ {}", added);
            }
            if let Some(elsewhere) = report.written_elsewhere(&file) {
                println!("{} (written instead of {})", elsewhere, file);
            } else if let Some(written) = &report.written {
                println!("{}", written);
            }
        }
        Commands::Show { file } => {
            let (_, project) = service.load_project(&file)?;
            let yaml = serde_yaml_ng::to_string(&project)
                .with_context(|| format!("Failed to serialize {}", file))?;
            print!("{}", yaml);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_modinfo2proj() {
        let cli = Cli::try_parse_from([
            "modtools",
            "modinfo2proj",
            "Mod (v 1).modinfo",
            "-o",
            "out/Mod.civ5proj",
            "--no-solution",
        ])
        .unwrap();

        match cli.command {
            Commands::ModinfoToProj {
                input,
                output,
                no_solution,
            } => {
                assert_eq!(input, "Mod (v 1).modinfo");
                assert_eq!(output.as_deref().map(|p| p.as_str()), Some("out/Mod.civ5proj"));
                assert!(no_solution);
            }
            _ => panic!("wrong subcommand"),
        }
        assert_eq!(cli.config_dir, ".");
    }

    #[test]
    fn test_parse_sync_files_with_global_flags() {
        let cli = Cli::try_parse_from([
            "modtools",
            "sync-files",
            "Mod.civ5proj",
            "--import",
            "--debug",
            "--config-dir",
            "conf",
        ])
        .unwrap();

        assert!(cli.debug);
        assert_eq!(cli.config_dir, "conf");
        assert!(matches!(
            cli.command,
            Commands::SyncFiles { import: true, dir: None, .. }
        ));
    }
}
