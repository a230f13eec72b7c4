//! Data models for mod descriptors and tool settings.
//!
//! - [`ProjectModel`]: The canonical mod description shared by the `.modinfo` and `.civ5proj` codecs
//! - [`FileEntry`], [`Association`], [`Action`], [`EntryPoint`]: The project's collections
//! - [`ModSolution`]: A `.civ5sln` solution and its [`ProjectReference`] list
//! - [`ToolSettings`]: Settings loaded from `modtools.yaml`
//!
//! Models hold data only. Reading and writing files is the job of
//! [`crate::codec`] and [`crate::services`].

pub mod config;
pub mod project;
pub mod solution;

pub use config::{LoggingSettings, ToolSettings};
pub use project::{
    Action, ActionType, Association, AssociationKind, EntryPoint, FileEntry, ProjectModel,
    new_guid,
};
pub use solution::{ModSolution, ProjectReference};
