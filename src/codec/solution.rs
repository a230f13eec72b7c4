//! `.civ5sln` solution index codec.
//!
//! A line-oriented Visual Studio style text file. The build tool expects a
//! UTF-8 byte-order mark and the exact line order produced by [`encode`].

use crate::error::{ModError, Result};
use crate::models::{ModSolution, ProjectReference};
use crate::paths::to_game_path;
use regex::Regex;
use std::sync::LazyLock;

/// Type marker for ModBuddy projects inside a solution.
pub const PROJECT_TYPE_GUID: &str = "{F5FC21B5-7CC2-458A-ABBA-992F515BBA20}";

pub const EXTENSION: &str = "civ5sln";

const BOM: char = '\u{feff}';
const LINE_ENDING: &str = "\r\n";
const PLATFORMS: [&str; 3] = ["Default|x86", "Deploy Only|x86", "Package Only|x86"];

static FIRST_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Project.*?\s*=\s*"([^"]+)""#).expect("Invalid name regex"));

static PROJECT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"Project\("(\{[^}]+\})"\)\s*=\s*"([^"]+)"\s*,\s*"([^"]+)"\s*,\s*"(\{[^}]+\})""#,
    )
    .expect("Invalid project regex")
});

/// Decode solution text, with or without a leading byte-order mark.
///
/// The solution is named after the first project declaration. Declarations
/// with a type other than [`PROJECT_TYPE_GUID`] are skipped.
///
/// # Errors
///
/// [`ModError::Format`] if the text holds no project declaration at all.
pub fn decode(text: &str) -> Result<ModSolution> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let name = FIRST_NAME_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ModError::format("no project declaration found in solution"))?
        .as_str();

    let mut solution = ModSolution::new(name);
    for captures in PROJECT_PATTERN.captures_iter(text) {
        let type_guid = &captures[1];
        if !type_guid.eq_ignore_ascii_case(PROJECT_TYPE_GUID) {
            tracing::debug!("Skipping solution entry of type {}", type_guid);
            continue;
        }
        solution.projects.push(ProjectReference {
            name: captures[2].to_string(),
            path: captures[3].to_string(),
            guid: captures[4].to_string(),
        });
    }

    Ok(solution)
}

/// Encode a solution, including the byte-order mark and CRLF line endings.
pub fn encode(solution: &ModSolution) -> String {
    let mut lines: Vec<String> = vec![
        String::new(),
        "Microsoft Visual Studio Solution File, Format Version 11.00".to_string(),
        "# ModBuddy Solution File, Format Version 11.00".to_string(),
    ];

    for project in &solution.projects {
        lines.push(format!(
            r#"Project("{}") = "{}", "{}", "{}""#,
            PROJECT_TYPE_GUID,
            project.name,
            to_game_path(&project.path),
            braced(&project.guid)
        ));
        lines.push("EndProject".to_string());
    }

    lines.push("Global".to_string());
    lines.push("\tGlobalSection(SolutionConfigurationPlatforms) = preSolution".to_string());
    for platform in PLATFORMS {
        lines.push(format!("\t\t{} = {}", platform, platform));
    }
    lines.push("\tEndGlobalSection".to_string());

    lines.push("\tGlobalSection(ProjectConfigurationPlatforms) = postSolution".to_string());
    for project in &solution.projects {
        let guid = braced(&project.guid).to_uppercase();
        for platform in PLATFORMS {
            lines.push(format!("\t\t{}.{}.ActiveCfg = {}", guid, platform, platform));
            lines.push(format!("\t\t{}.{}.Build.0 = {}", guid, platform, platform));
        }
    }
    lines.push("\tEndGlobalSection".to_string());

    lines.push("\tGlobalSection(SolutionProperties) = preSolution".to_string());
    lines.push("\t\tHideSolutionNode = FALSE".to_string());
    lines.push("\tEndGlobalSection".to_string());
    lines.push("EndGlobal".to_string());

    let mut text = String::new();
    text.push(BOM);
    text.push_str(&lines.join(LINE_ENDING));
    text.push_str(LINE_ENDING);
    text
}

/// Make sure `project_file_name` is listed in a solution.
///
/// An existing solution that already lists the file is returned unchanged;
/// otherwise a reference with a fresh GUID is appended. With no existing
/// solution, a new one holding just this project is created.
pub fn merge_or_create(
    existing: Option<ModSolution>,
    project_file_name: &str,
    project_name: &str,
) -> ModSolution {
    match existing {
        Some(solution) if solution.projects.iter().any(|p| p.path == project_file_name) => {
            solution
        }
        Some(mut solution) => {
            tracing::debug!(
                "Adding {} to solution '{}'",
                project_file_name,
                solution.name
            );
            solution
                .projects
                .push(ProjectReference::new(project_file_name, project_name));
            solution
        }
        None => ModSolution::for_project(project_file_name, project_name),
    }
}

fn braced(guid: &str) -> String {
    format!("{{{}}}", guid.trim_matches(|c| c == '{' || c == '}'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\u{feff}\r\nMicrosoft Visual Studio Solution File, Format Version 11.00\r\n\
# ModBuddy Solution File, Format Version 11.00\r\n\
Project(\"{f5fc21b5-7cc2-458a-abba-992f515bba20}\") = \"Community Patch\", \"Community Patch.civ5proj\", \"{0d66d522-b624-4bc5-acfe-15a0c5b729f4}\"\r\n\
EndProject\r\n\
Project(\"{2150E333-8FDC-42A3-9474-1A3956D46DE8}\") = \"Folder\", \"Folder\", \"{11111111-0000-0000-0000-000000000000}\"\r\n\
EndProject\r\n\
Global\r\nEndGlobal\r\n";

    #[test]
    fn test_decode_sample() {
        let solution = decode(SAMPLE).unwrap();

        assert_eq!(solution.name, "Community Patch");
        assert_eq!(solution.configuration, "Default");
        assert_eq!(solution.projects.len(), 1);
        assert_eq!(solution.projects[0].name, "Community Patch");
        assert_eq!(solution.projects[0].path, "Community Patch.civ5proj");
        assert_eq!(
            solution.projects[0].guid,
            "{0d66d522-b624-4bc5-acfe-15a0c5b729f4}"
        );
    }

    #[test]
    fn test_decode_without_projects_fails() {
        let text = "Microsoft Visual Studio Solution File, Format Version 11.00\r\nGlobal\r\nEndGlobal";
        assert!(matches!(decode(text), Err(ModError::Format(_))));
    }

    #[test]
    fn test_encode_layout() {
        let mut solution = ModSolution::new("Test");
        solution.projects.push(ProjectReference {
            path: "sub/Test.civ5proj".to_string(),
            name: "Test".to_string(),
            guid: "0d66d522-b624-4bc5-acfe-15a0c5b729f4".to_string(),
        });

        let text = encode(&solution);
        assert!(text.starts_with("\u{feff}\r\nMicrosoft Visual Studio Solution File"));
        assert!(text.ends_with("EndGlobal\r\n"));

        let lines: Vec<&str> = text.trim_start_matches(BOM).split("\r\n").collect();
        assert_eq!(
            lines[3],
            r#"Project("{F5FC21B5-7CC2-458A-ABBA-992F515BBA20}") = "Test", "sub\Test.civ5proj", "{0d66d522-b624-4bc5-acfe-15a0c5b729f4}""#
        );
        assert_eq!(lines[4], "EndProject");
        assert_eq!(lines[5], "Global");

        let start = lines
            .iter()
            .position(|l| l.contains("ProjectConfigurationPlatforms"))
            .unwrap();
        let end = start + 1 + lines[start + 1..]
            .iter()
            .position(|l| *l == "\tEndGlobalSection")
            .unwrap();
        let mapping = &lines[start + 1..end];
        assert_eq!(mapping.len(), 6);
        assert_eq!(
            mapping[0],
            "\t\t{0D66D522-B624-4BC5-ACFE-15A0C5B729F4}.Default|x86.ActiveCfg = Default|x86"
        );
        assert_eq!(
            mapping[5],
            "\t\t{0D66D522-B624-4BC5-ACFE-15A0C5B729F4}.Package Only|x86.Build.0 = Package Only|x86"
        );
    }

    #[test]
    fn test_encode_then_decode_keeps_references() {
        let original = decode(SAMPLE).unwrap();
        let reloaded = decode(&encode(&original)).unwrap();

        assert_eq!(reloaded.name, original.name);
        assert_eq!(reloaded.projects, original.projects);
    }

    #[test]
    fn test_merge_existing_reference_is_unchanged() {
        let existing = decode(SAMPLE).unwrap();
        let merged = merge_or_create(
            Some(existing.clone()),
            "Community Patch.civ5proj",
            "Community Patch",
        );
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_merge_appends_new_reference() {
        let existing = decode(SAMPLE).unwrap();
        let merged = merge_or_create(Some(existing.clone()), "Extra.civ5proj", "Extra");

        assert_eq!(merged.projects.len(), existing.projects.len() + 1);
        assert_eq!(merged.projects[0], existing.projects[0]);
        assert_eq!(merged.projects[1].path, "Extra.civ5proj");
        assert_eq!(merged.projects[1].name, "Extra");
        assert!(merged.projects[1].guid.starts_with('{'));
    }

    #[test]
    fn test_merge_without_existing_creates_fresh() {
        let merged = merge_or_create(None, "New.civ5proj", "New Mod");
        assert_eq!(merged.name, "New Mod");
        assert_eq!(merged.projects.len(), 1);
        assert_eq!(merged.projects[0].path, "New.civ5proj");
    }
}
