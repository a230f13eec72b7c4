//! File format codecs.
//!
//! - [`manifest`]: `.modinfo` runtime manifest <-> [`ProjectModel`](crate::models::ProjectModel)
//! - [`build_project`]: `.civ5proj` MSBuild project <-> [`ProjectModel`](crate::models::ProjectModel)
//! - [`solution`]: `.civ5sln` solution index <-> [`ModSolution`](crate::models::ModSolution)
//!
//! Codecs work on bytes and strings only; file I/O lives in
//! [`crate::services`].

pub mod build_project;
pub mod manifest;
pub mod solution;
pub mod xml;

pub use manifest::ManifestDocument;

use crate::error::{ModError, Result};
use camino::Utf8Path;
use std::fmt;

pub const MANIFEST_EXTENSION: &str = "modinfo";

/// Descriptor file kinds, dispatched on file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Manifest,
    BuildProject,
    Solution,
}

impl FileKind {
    /// Kind of `path`, matched on its extension case-insensitively.
    ///
    /// # Errors
    ///
    /// [`ModError::UnsupportedExtension`] for any other extension.
    pub fn from_path(path: &Utf8Path) -> Result<Self> {
        let extension = path.extension().unwrap_or_default();
        match extension.to_ascii_lowercase().as_str() {
            MANIFEST_EXTENSION => Ok(Self::Manifest),
            build_project::EXTENSION => Ok(Self::BuildProject),
            solution::EXTENSION => Ok(Self::Solution),
            _ => Err(ModError::UnsupportedExtension(format!(".{}", extension))),
        }
    }

    /// Extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Manifest => MANIFEST_EXTENSION,
            Self::BuildProject => build_project::EXTENSION,
            Self::Solution => solution::EXTENSION,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Manifest => "manifest",
            Self::BuildProject => "build project",
            Self::Solution => "solution",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_from_path() {
        assert_eq!(
            FileKind::from_path(Utf8Path::new("Mod (v 1).modinfo")).unwrap(),
            FileKind::Manifest
        );
        assert_eq!(
            FileKind::from_path(Utf8Path::new("dir/Mod.CIV5PROJ")).unwrap(),
            FileKind::BuildProject
        );
        assert_eq!(
            FileKind::from_path(Utf8Path::new("Mod.civ5sln")).unwrap(),
            FileKind::Solution
        );
    }

    #[test]
    fn test_file_kind_rejects_other_extensions() {
        let err = FileKind::from_path(Utf8Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, ModError::UnsupportedExtension(ref e) if e == ".txt"));
        assert!(FileKind::from_path(Utf8Path::new("Makefile")).is_err());
    }
}
