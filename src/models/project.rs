use crate::error::ModError;
use crate::paths::{paths_equal, to_game_path};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Generate a braced v4 GUID, the identity format used by both descriptor files.
pub fn new_guid() -> String {
    format!("{{{}}}", Uuid::new_v4())
}

/// Kind of mod association (dependency or blocker target).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationKind {
    Game,
    Dlc,
    Mod,
}

impl AssociationKind {
    /// Name used for the association `Type` in both formats.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "Game",
            Self::Dlc => "Dlc",
            Self::Mod => "Mod",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssociationKind {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Game" => Ok(Self::Game),
            "Dlc" => Ok(Self::Dlc),
            "Mod" => Ok(Self::Mod),
            other => Err(ModError::format(format!("unknown association type: {:?}", other))),
        }
    }
}

/// A dependency on, or block against, the base game, a DLC, or another mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub kind: AssociationKind,
    pub name: String,
    /// Absent for `Game` associations
    pub id: Option<String>,
    pub min_version: String,
    pub max_version: String,
}

impl Association {
    pub const DEFAULT_MIN_VERSION: &'static str = "0";
    pub const DEFAULT_MAX_VERSION: &'static str = "999";

    /// Association with no name or id and the default version range.
    pub fn new(kind: AssociationKind) -> Self {
        Self {
            kind,
            name: String::new(),
            id: None,
            min_version: Self::DEFAULT_MIN_VERSION.to_string(),
            max_version: Self::DEFAULT_MAX_VERSION.to_string(),
        }
    }

    /// Dependency on the base game.
    pub fn game() -> Self {
        Self::new(AssociationKind::Game)
    }

    /// Dependency on the DLC with GUID `id`.
    pub fn dlc(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new(AssociationKind::Dlc)
        }
    }

    /// Block against another mod; `title` is only kept for display.
    pub fn mod_blocker(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: title.into(),
            ..Self::new(AssociationKind::Mod)
        }
    }

    pub fn with_versions(mut self, min: impl Into<String>, max: impl Into<String>) -> Self {
        self.min_version = min.into();
        self.max_version = max.into();
        self
    }
}

/// A file shipped with the mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub import_to_vfs: bool,
    /// `SubType` in the build-project format; the manifest has no such field
    pub subtype: String,
    /// Uppercase hex MD5, as last read from a manifest
    pub md5: Option<String>,
}

impl FileEntry {
    /// File entry with no subtype and no recorded checksum.
    ///
    /// `path` is stored as given; the encoders write it in game form.
    pub fn new(path: impl Into<String>, import_to_vfs: bool) -> Self {
        Self {
            path: path.into(),
            import_to_vfs,
            subtype: String::new(),
            md5: None,
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = subtype.into();
        self
    }
}

/// The action types the game understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    UpdateDatabase,
    SetDllPath,
}

impl ActionType {
    /// Action element name in a manifest, `Type` text in a build project.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateDatabase => "UpdateDatabase",
            Self::SetDllPath => "SetDllPath",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UpdateDatabase" => Ok(Self::UpdateDatabase),
            "SetDllPath" => Ok(Self::SetDllPath),
            other => Err(ModError::format(format!("unknown action type: {:?}", other))),
        }
    }
}

/// An action run by the game during one activation phase (the action set).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub action_set: String,
    pub action_type: ActionType,
    pub filename: String,
}

impl Action {
    pub const DEFAULT_SET: &'static str = "OnModActivated";

    pub fn new(
        action_set: impl Into<String>,
        action_type: ActionType,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            action_set: action_set.into(),
            action_type,
            filename: filename.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub entry_type: String,
    pub file: String,
    pub name: String,
    pub description: String,
}

impl EntryPoint {
    pub const DEFAULT_TYPE: &'static str = "InGameUIAddin";

    pub fn new(entry_type: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            file: file.into(),
            name: String::new(),
            description: String::new(),
        }
    }
}

/// Canonical in-memory description of a mod.
///
/// Both the `.modinfo` and `.civ5proj` codecs decode into and encode from
/// this type, which is what makes cross-format conversion possible. It is a
/// plain data holder: fields are public and mutation performs no validation.
///
/// # Invariants
///
/// - Path fields hold canonical game paths when produced by a codec. Direct
///   mutation does not normalize; the encoders normalize on output.
/// - The minimum compatible save version is never stored when it equals
///   `version`. Read it through [`min_compatible_save_version`](Self::min_compatible_save_version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    // Identity
    pub name: String,
    pub project_id: String,
    pub mod_id: String,
    pub version: String,
    pub stability: String,

    // Descriptive text, empty when absent
    pub teaser: String,
    pub description: String,
    pub authors: String,
    pub special_thanks: String,
    pub homepage: String,

    // Capability flags
    pub affects_saved_games: bool,
    pub supports_single_player: bool,
    pub supports_multiplayer: bool,
    pub supports_hot_seat: bool,
    pub supports_mac: bool,
    pub hide_setup_game: bool,
    pub reload_audio: bool,
    pub reload_landmark: bool,
    pub reload_strategic_view: bool,
    pub reload_unit: bool,

    /// Empty means "same as `version`"
    min_save_version_override: String,

    // Content, order preserved, duplicates allowed
    pub dependencies: Vec<Association>,
    pub blockers: Vec<Association>,
    pub files: Vec<FileEntry>,
    pub actions: Vec<Action>,
    pub entry_points: Vec<EntryPoint>,
}

impl ProjectModel {
    pub const DEFAULT_VERSION: &'static str = "1";
    pub const DEFAULT_STABILITY: &'static str = "Stable";

    /// Create a project with fresh identities and default flags.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project_id: new_guid(),
            mod_id: new_guid(),
            version: Self::DEFAULT_VERSION.to_string(),
            stability: Self::DEFAULT_STABILITY.to_string(),
            teaser: String::new(),
            description: String::new(),
            authors: String::new(),
            special_thanks: String::new(),
            homepage: String::new(),
            affects_saved_games: true,
            supports_single_player: true,
            supports_multiplayer: true,
            supports_hot_seat: true,
            supports_mac: true,
            hide_setup_game: false,
            reload_audio: true,
            reload_landmark: true,
            reload_strategic_view: true,
            reload_unit: true,
            min_save_version_override: String::new(),
            dependencies: Vec::new(),
            blockers: Vec::new(),
            files: Vec::new(),
            actions: Vec::new(),
            entry_points: Vec::new(),
        }
    }

    /// Minimum save version this mod can load; defaults to `version`.
    pub fn min_compatible_save_version(&self) -> &str {
        if self.min_save_version_override.is_empty() {
            &self.version
        } else {
            &self.min_save_version_override
        }
    }

    /// Set the minimum compatible save version.
    ///
    /// A value equal to the current `version` clears the override so the two
    /// keep tracking each other when `version` changes later.
    pub fn set_min_compatible_save_version(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value == self.version {
            self.min_save_version_override.clear();
        } else {
            self.min_save_version_override = value;
        }
    }

    /// True when the minimum save version differs from `version`.
    pub fn has_min_save_version_override(&self) -> bool {
        !self.min_save_version_override.is_empty()
    }

    /// True if a file entry refers to `path` (case- and separator-insensitive).
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| paths_equal(&f.path, path))
    }

    /// File entries in the order both encoders write them: ascending canonical path.
    pub fn sorted_files(&self) -> Vec<&FileEntry> {
        let mut files: Vec<(String, &FileEntry)> = self
            .files
            .iter()
            .map(|f| (to_game_path(&f.path), f))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files.into_iter().map(|(_, f)| f).collect()
    }
}

impl Default for ProjectModel {
    fn default() -> Self {
        Self::new("")
    }
}
