//! Content checksums for files imported into the game's virtual file system.

use crate::error::{ModError, Result};
use crate::paths::to_system_path;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{ErrorKind, Read};

const READ_CHUNK: usize = 4096;

/// Compute the uppercase hex MD5 digest of a file's raw bytes.
///
/// # Errors
///
/// Returns [`ModError::ChecksumUnavailable`] if the file does not exist and
/// [`ModError::Io`] for any other read failure.
pub fn file_md5(path: &Utf8Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ModError::ChecksumUnavailable(path.to_path_buf()),
        _ => ModError::Io(e),
    })?;

    let mut context = md5::Context::new();
    let mut buffer = [0u8; READ_CHUNK];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        context.consume(&buffer[..read]);
    }

    Ok(format!("{:X}", context.finalize()))
}

/// Source of checksums for game paths referenced by a manifest.
#[cfg_attr(test, mockall::automock)]
pub trait ChecksumSource {
    /// Digest for the file at `game_path`, or [`ModError::ChecksumUnavailable`].
    fn checksum(&self, game_path: &str) -> Result<String>;
}

/// Looks files up under a mod directory on disk.
#[derive(Debug, Clone)]
pub struct DirectoryChecksums {
    base_path: Utf8PathBuf,
}

impl DirectoryChecksums {
    /// Resolve game paths against `base_path`.
    pub fn new<P: AsRef<Utf8Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }
}

impl ChecksumSource for DirectoryChecksums {
    fn checksum(&self, game_path: &str) -> Result<String> {
        let system_path = to_system_path(&self.base_path, game_path);
        if !system_path.is_file() {
            return Err(ModError::ChecksumUnavailable(system_path));
        }
        file_md5(&system_path)
    }
}
