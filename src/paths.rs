//! Path utilities for mod descriptor files.
//!
//! Both XML formats store mod-internal paths ("game paths") with Windows
//! backslash separators, while the files themselves live on whatever host the
//! tool runs on. This module converts between the two and compares paths the
//! way the game does: case-insensitive and separator-insensitive.
//!
//! # Examples
//!
//! ```ignore
//! use modtools::paths::{paths_equal, to_game_path};
//!
//! assert_eq!(to_game_path("Assets/UI/test.dds"), "Assets\\UI\\test.dds");
//! assert!(paths_equal("Assets/UI/x.dds", "assets\\ui\\x.dds"));
//! ```

use crate::error::{ModError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Canonicalize a path to game-path form.
///
/// `.` segments are dropped and `..` segments collapse the preceding segment.
/// Leading `..` segments that cannot be collapsed are kept (they are not an
/// error). Both `/` and `\` count as separators on input; the output always
/// uses `\`. An empty path normalizes to `"."`.
pub fn to_game_path(path: &str) -> String {
    let rooted = path.starts_with(SEPARATORS);
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(SEPARATORS) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            name => segments.push(name),
        }
    }

    let joined = segments.join("\\");
    if rooted {
        format!("\\{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Resolve a game path against a host directory.
///
/// Backslashes become the host separator, the result is joined onto
/// `base_path`, and `.`/`..` components are resolved lexically (no
/// filesystem access, symlinks are not followed).
pub fn to_system_path(base_path: &Utf8Path, game_path: &str) -> Utf8PathBuf {
    let relative = game_path.replace('\\', std::path::MAIN_SEPARATOR_STR);
    normalize_lexically(&base_path.join(relative))
}

fn normalize_lexically(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match out.components().next_back() {
                Some(Utf8Component::Normal(_)) => {
                    out.pop();
                }
                // The parent of a root is the root itself
                Some(Utf8Component::RootDir) | Some(Utf8Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_str()),
        }
    }

    if out.as_str().is_empty() {
        out.push(".");
    }
    out
}

/// Compare two paths ignoring case and separator style.
///
/// Paths are compared segment by segment after resolving `.` and `..`.
/// Two paths that resolve to the same segments are still considered
/// different when only one of them was written with a `..` segment, so
/// `a/b/../c` does not equal `a/c`.
pub fn paths_equal(a: &str, b: &str) -> bool {
    let segments_a = resolved_segments(a);
    let segments_b = resolved_segments(b);

    if segments_a != segments_b {
        return false;
    }

    has_parent_refs(a) == has_parent_refs(b)
}

fn resolved_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for segment in path.split(SEPARATORS) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name.to_lowercase()),
        }
    }
    segments
}

fn has_parent_refs(path: &str) -> bool {
    path.split(SEPARATORS).any(|segment| segment == "..")
}

/// List every regular file below `directory` as sorted game paths relative to it.
pub fn list_files(directory: &Utf8Path) -> Result<Vec<String>> {
    list_files_relative(directory, directory)
}

/// List every regular file below `directory` as game paths relative to `relative_to`.
///
/// The result is sorted in ascending byte order of the canonical form.
///
/// # Errors
///
/// - [`ModError::NotFound`] if `directory` does not exist
/// - [`ModError::InvalidPath`] if a file is not under `relative_to` or its
///   path is not valid UTF-8
pub fn list_files_relative(directory: &Utf8Path, relative_to: &Utf8Path) -> Result<Vec<String>> {
    if !directory.is_dir() {
        return Err(ModError::NotFound(directory.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(directory).follow_links(true) {
        let entry = entry.map_err(|e| ModError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = Utf8Path::from_path(entry.path())
            .ok_or_else(|| ModError::InvalidPath(entry.path().display().to_string()))?;
        let relative = path.strip_prefix(relative_to).map_err(|_| {
            ModError::InvalidPath(format!("{} is not under {}", path, relative_to))
        })?;

        files.push(to_game_path(relative.as_str()));
    }

    files.sort();
    tracing::debug!("Listed {} files under {}", files.len(), directory);
    Ok(files)
}
