use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use log::{debug, info};

use crate::{
    api::LockMode,
    fetch::{self, FetchedSource, ResolvedSource},
    model::{declaration::SourceDeclaration, descriptor::Descriptor, lock::LockFile},
    resolver::LockFileSourceResolver,
    source::SourceContext,
};

/// Handler to fetch command
/// Locks the sources first, then materializes every locked source
pub fn do_fetch(
    lock_mode: LockMode,
    context: &SourceContext,
    root: &Path,
    module_file_name: &Path,
    lock_file_name: &Path,
) -> anyhow::Result<Vec<FetchedSource>> {
    let (_, resolved) = lock_and_resolve(lock_mode, context, root, module_file_name, lock_file_name)?;
    let fetched = fetch::fetch_sources(&resolved, context.project().included_sources())?;
    info!("Fetched {} sources", fetched.len());
    Ok(fetched)
}

/// Handler to lock command
/// Generates, updates or verifies the lock file based on the descriptor
pub fn do_lock(
    lock_mode: LockMode,
    context: &SourceContext,
    root: &Path,
    module_file_name: &Path,
    lock_file_name: &Path,
) -> anyhow::Result<LockFile> {
    let (lock_file, _) =
        lock_and_resolve(lock_mode, context, root, module_file_name, lock_file_name)?;
    Ok(lock_file)
}

/// Handler to describe command
/// Resolves the sources, preferring pins from the lock file, without writing anything
pub fn do_describe(
    context: &SourceContext,
    root: &Path,
    module_file_name: &Path,
    lock_file_name: &Path,
) -> anyhow::Result<Vec<ResolvedSource>> {
    let descriptor = load_descriptor(root, module_file_name)?;
    let lock_file_path = root.join(lock_file_name);
    let resolved = if lock_file_path.exists() {
        let lock_file = LockFile::from_file(&lock_file_path)
            .with_context(|| format!("Could not read {}", lock_file_path.display()))?;
        let resolver = LockFileSourceResolver::new(context, &lock_file, false);
        fetch::resolve(&descriptor, &resolver)?
    } else {
        fetch::resolve(&descriptor, context)?
    };
    Ok(resolved)
}

pub fn do_clear_cache(context: &SourceContext) -> anyhow::Result<()> {
    context.cache().clear()
}

fn lock_and_resolve(
    lock_mode: LockMode,
    context: &SourceContext,
    root: &Path,
    module_file_name: &Path,
    lock_file_name: &Path,
) -> anyhow::Result<(LockFile, Vec<ResolvedSource>)> {
    let descriptor = load_descriptor(root, module_file_name)?;

    let lock_file_path = root.join(lock_file_name);

    let (old_lock, resolved) = match (lock_mode, lock_file_path.exists()) {
        (LockMode::Locked, false) => bail!("Lock file {} does not exist", lock_file_path.display()),

        (LockMode::Locked, true) => {
            let old_lock = read_lock_file(&lock_file_path)?;
            let resolver = LockFileSourceResolver::new(context, &old_lock, true);
            debug!("Verifying lockfile...");
            let resolved = fetch::resolve(&descriptor, &resolver)?;
            (Some(old_lock), resolved)
        }

        (LockMode::Update, true) => {
            let old_lock = read_lock_file(&lock_file_path)?;
            let resolver = LockFileSourceResolver::new(context, &old_lock, false);
            debug!("Updating lockfile...");
            let resolved = fetch::resolve(&descriptor, &resolver)?;
            (Some(old_lock), resolved)
        }

        (LockMode::Update, false) | (LockMode::Recreate, _) => {
            debug!("Generating lockfile...");
            (None, fetch::resolve(&descriptor, context)?)
        }
    };

    let lock_file = fetch::lock(&resolved);
    debug!("Generated lockfile: {:?}", lock_file);

    match old_lock {
        Some(old_lock) if old_lock == lock_file => debug!("Lockfile is up to date"),
        _ if lock_mode == LockMode::Locked => {
            bail!("Lock file {} is out of date", lock_file_path.display())
        }
        _ => {
            write_atomically(&lock_file_path, &lock_file.to_string()?)?;
            info!("Wrote lockfile to {}", lock_file_path.display());
        }
    }

    Ok((lock_file, resolved))
}

fn read_lock_file(path: &Path) -> anyhow::Result<LockFile> {
    LockFile::from_file(path).with_context(|| format!("Could not read {}", path.display()))
}

/// Loads the descriptor, anchoring relative local folders at `root`.
fn load_descriptor(root: &Path, module_file_name: &Path) -> anyhow::Result<Descriptor> {
    let path = root.join(module_file_name);
    let mut descriptor =
        Descriptor::from_file(&path).with_context(|| format!("Could not read {}", path.display()))?;
    for declaration in descriptor.sources.values_mut() {
        if let SourceDeclaration::LocalFolder { path } = declaration {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }
    Ok(descriptor)
}

fn write_atomically(path: &Path, contents: &str) -> anyhow::Result<()> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut file = tempfile::NamedTempFile::new_in(&directory)?;
    file.write_all(contents.as_bytes())?;
    file.persist(path)
        .with_context(|| format!("Could not write {}", path.display()))?;
    Ok(())
}
