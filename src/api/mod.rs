use std::path::PathBuf;

use crate::{
    cli::command_handlers::{do_clear_cache, do_describe, do_fetch, do_lock},
    fetch::{FetchedSource, ResolvedSource},
    model::lock::LockFile,
    source::SourceContext,
};

mod builder;

pub use builder::SourcefetchBuilder;

pub struct Sourcefetch {
    context: SourceContext,
    root: PathBuf,
    module_file_name: PathBuf,
    lock_file_name: PathBuf,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LockMode {
    /// Verify that the lock file is up to date. This mode should be normally used on CI.
    Locked,
    /// Update the lock file if necessary.
    Update,
    /// Recreate the lock file from scratch.
    Recreate,
}

impl Sourcefetch {
    pub fn builder() -> SourcefetchBuilder {
        SourcefetchBuilder::default()
    }

    pub fn context(&self) -> &SourceContext {
        &self.context
    }

    /// Fetches the sources defined in the descriptor into the snapshot cache
    pub fn fetch(&self, lock_mode: LockMode) -> anyhow::Result<Vec<FetchedSource>> {
        do_fetch(
            lock_mode,
            &self.context,
            &self.root,
            &self.module_file_name,
            &self.lock_file_name,
        )
    }

    /// Creates, updates or verifies a lock file based on the descriptor
    pub fn lock(&self, lock_mode: LockMode) -> anyhow::Result<LockFile> {
        do_lock(
            lock_mode,
            &self.context,
            &self.root,
            &self.module_file_name,
            &self.lock_file_name,
        )
    }

    /// Resolves the declared sources without writing the lock file
    pub fn describe(&self) -> anyhow::Result<Vec<ResolvedSource>> {
        do_describe(
            &self.context,
            &self.root,
            &self.module_file_name,
            &self.lock_file_name,
        )
    }

    pub fn clear_cache(&self) -> anyhow::Result<()> {
        do_clear_cache(&self.context)
    }
}
