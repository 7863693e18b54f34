use log::debug;

use crate::{
    model::{declaration::SourceDeclaration, lock::LockFile},
    source::{Source, SourceError},
};

use super::SourceResolver;

/// Resolves declarations through the pins of an existing lock file.
///
/// Entries are used only when they were locked from the same repository and
/// revision request. With `locked`, a declaration without a matching entry is an error.
pub struct LockFileSourceResolver<'a, R> {
    inner: R,
    lock_file: &'a LockFile,
    locked: bool,
}

impl<'a, R> LockFileSourceResolver<'a, R> {
    pub fn new(inner: R, lock_file: &'a LockFile, locked: bool) -> Self {
        Self {
            inner,
            lock_file,
            locked,
        }
    }
}

impl<'a, R> SourceResolver for LockFileSourceResolver<'a, R>
where
    R: SourceResolver,
{
    fn resolve(&self, name: &str, declaration: &SourceDeclaration) -> Result<Source, SourceError> {
        if let SourceDeclaration::LocalFolder { .. } = declaration {
            return self.inner.resolve(name, declaration);
        }
        let entry = self
            .lock_file
            .find(name)
            .filter(|entry| entry.matches(declaration));
        match entry {
            Some(entry) => {
                debug!(
                    "Source {} {} found in the lock file with commit {}",
                    name, declaration, entry.frozen.commit
                );
                self.inner.resolve(name, &entry.frozen.clone().into())
            }
            None if self.locked => Err(SourceError::NotLocked {
                name: name.to_string(),
                declaration: declaration.to_string(),
            }),
            None => {
                debug!("Source {} {} not found in the lock file", name, declaration);
                self.inner.resolve(name, declaration)
            }
        }
    }
}
