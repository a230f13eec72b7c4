use crate::models::project::new_guid;
use serde::{Deserialize, Serialize};

/// One build project listed in a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    pub path: String,
    pub name: String,
    pub guid: String,
}

impl ProjectReference {
    /// Reference with a freshly generated project GUID.
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            guid: new_guid(),
        }
    }
}

/// A `.civ5sln` solution: a named, ordered list of build projects.
///
/// Independent of [`ProjectModel`](crate::models::ProjectModel); the two are
/// linked only by the project file name stored in each reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModSolution {
    pub name: String,
    pub guid: String,
    pub configuration: String,
    pub projects: Vec<ProjectReference>,
}

impl ModSolution {
    pub const CONFIGURATION: &'static str = "Default";

    /// Empty solution with a new GUID and the `Default` configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            guid: new_guid(),
            configuration: Self::CONFIGURATION.to_string(),
            projects: Vec::new(),
        }
    }

    /// A fresh solution containing exactly one project.
    pub fn for_project(project_file_name: impl Into<String>, project_name: impl Into<String>) -> Self {
        let project_name = project_name.into();
        let mut solution = Self::new(project_name.clone());
        solution
            .projects
            .push(ProjectReference::new(project_file_name, project_name));
        solution
    }
}
