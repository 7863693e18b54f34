use std::{
    fs::{self, File},
    io::{self, Cursor},
    path::{Path, PathBuf},
};

use log::trace;
use zip::ZipArchive;

use super::CacheError;

/// Unpacks a zip snapshot into `destination` and returns its single top-level directory.
pub(super) fn unpack(data: &[u8], destination: &Path) -> Result<PathBuf, CacheError> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let relative = entry
            .enclosed_name()
            .map(Path::to_path_buf)
            .ok_or_else(|| CacheError::UnsafeEntry(entry.name().to_string()))?;
        let target = destination.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        trace!("Unpacking {}", relative.display());
        let mut file = File::create(&target)?;
        io::copy(&mut entry, &mut file)?;
        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode().map(|mode| mode & 0o777) {
            use std::os::unix::fs::PermissionsExt;
            if mode != 0 {
                fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
            }
        }
    }
    single_top_level(destination)
}

fn single_top_level(destination: &Path) -> Result<PathBuf, CacheError> {
    let entries = fs::read_dir(destination)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    match entries.as_slice() {
        [root] if root.is_dir() => Ok(root.clone()),
        _ => Err(CacheError::ArchiveLayout {
            found: entries.len(),
        }),
    }
}
