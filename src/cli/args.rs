use std::path::PathBuf;

use clap::Parser;

/// Pins GitHub repositories and local folders, and fetches them into a shared cache.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Project root; descriptor, lock file and relative paths are resolved against it
    #[clap(short, long)]
    pub root: Option<PathBuf>,
    #[clap(short, long, default_value = "sourcefetch.toml")]
    pub module_location: PathBuf,
    #[clap(short, long, default_value = "sourcefetch.lock")]
    pub lockfile_location: PathBuf,
    /// Defaults to $HOME/.sourcefetch/cache
    #[clap(short, long)]
    pub cache_directory: Option<PathBuf>,
    /// Optional configuration file, overridden by SOURCEFETCH_* environment variables
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub enum Command {
    ///Fetches the sources declared in the descriptor into the cache
    Fetch {
        /// Fail if the lock file is missing or out of date
        #[clap(long)]
        locked: bool,
    },
    ///Creates or updates the lock file based on the descriptor
    Lock {
        /// Only verify that the lock file is up to date
        #[clap(long)]
        locked: bool,
        /// Resolve every source again, ignoring the existing lock file
        #[clap(long, conflicts_with = "locked")]
        recreate: bool,
    },
    ///Prints what every declared source resolves to
    Describe,
    ///Removes every cached snapshot
    ClearCache,
}
