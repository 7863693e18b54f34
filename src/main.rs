use std::process::ExitCode;

use clap::Parser;
use log::error;

use sourcefetch::{
    cli::args::{CliArgs, Command},
    LockMode, Sourcefetch,
};

fn run() -> anyhow::Result<()> {
    let cli_args: CliArgs = CliArgs::parse();

    let mut builder = Sourcefetch::builder()
        .module_file_name(cli_args.module_location)
        .lock_file_name(cli_args.lockfile_location);
    if let Some(root) = cli_args.root {
        builder = builder.root(root);
    }
    if let Some(cache_directory) = cli_args.cache_directory {
        builder = builder.cache_directory(cache_directory);
    }
    if let Some(config) = cli_args.config {
        builder = builder.config_file(config);
    }
    let sourcefetch = builder.try_build()?;

    match cli_args.cmd {
        Command::Fetch { locked } => {
            let lock_mode = if locked {
                LockMode::Locked
            } else {
                LockMode::Update
            };
            sourcefetch.fetch(lock_mode)?;
        }
        Command::Lock { locked, recreate } => {
            let lock_mode = match (locked, recreate) {
                (true, _) => LockMode::Locked,
                (false, true) => LockMode::Recreate,
                (false, false) => LockMode::Update,
            };
            sourcefetch.lock(lock_mode)?;
        }
        Command::Describe => {
            for resolved in sourcefetch.describe()? {
                println!("{}: {}", resolved.name, resolved.source);
            }
        }
        Command::ClearCache => sourcefetch.clear_cache()?,
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
