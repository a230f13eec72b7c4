//! Integration tests for ConversionService
//!
//! These tests verify:
//! - Manifest <-> build project conversion on disk
//! - Build project file naming and solution maintenance
//! - Checksum updates and untracked file sync
//! - Error kinds surfaced through anyhow

use camino::{Utf8Path, Utf8PathBuf};
use modtools::codec::solution;
use modtools::models::{ModSolution, ProjectReference, ToolSettings};
use modtools::{ConversionService, FileKind, ModError, ProjectModel};
use std::fs;
use std::sync::atomic::Ordering;
use tempfile::TempDir;

const MANIFEST_FIXTURE: &[u8] = include_bytes!("data/Sample Mod (v 2).modinfo");
const BUILD_PROJECT_FIXTURE: &[u8] = include_bytes!("data/Sample Mod.civ5proj");
const SOLUTION_FIXTURE: &[u8] = include_bytes!("data/Sample Mod.civ5sln");

fn mod_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

fn write_fixture(dir: &Utf8Path, name: &str, bytes: &[u8]) -> Utf8PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn test_manifest_to_build_project_uses_derived_name() {
    let (_temp_dir, root) = mod_dir();
    let input = write_fixture(&root, "Sample Mod (v 2).modinfo", MANIFEST_FIXTURE);
    let service = ConversionService::default();

    let written = service
        .manifest_to_build_project(&input, Some(&root.join("whatever.civ5proj")), true)
        .unwrap();

    assert_eq!(written, root.join("Sample Mod.civ5proj"));
    assert!(written.exists());
    assert!(!root.join("whatever.civ5proj").exists());

    let solution_path = root.join("Sample Mod.civ5sln");
    let text = fs::read_to_string(&solution_path).unwrap();
    assert!(text.starts_with('\u{feff}'));

    let solution = solution::decode(&text).unwrap();
    assert_eq!(solution.name, "Sample Mod (v 2)");
    assert_eq!(solution.projects.len(), 1);
    assert_eq!(solution.projects[0].path, "Sample Mod.civ5proj");

    let project = service.load_build_project(&written).unwrap();
    assert_eq!(project.name, "Sample Mod (v 2)");
    assert_eq!(service.metrics().solutions_updated.load(Ordering::Relaxed), 1);
}

#[test]
fn test_no_solution_flag_and_setting() {
    let (_temp_dir, root) = mod_dir();
    let input = write_fixture(&root, "Sample Mod (v 2).modinfo", MANIFEST_FIXTURE);

    let service = ConversionService::default();
    service.manifest_to_build_project(&input, None, false).unwrap();
    assert!(!root.join("Sample Mod.civ5sln").exists());

    let settings = ToolSettings {
        create_solution: false,
        ..ToolSettings::default()
    };
    let service = ConversionService::new(settings);
    service.manifest_to_build_project(&input, None, true).unwrap();
    assert!(!root.join("Sample Mod.civ5sln").exists());
}

#[test]
fn test_existing_solution_is_merged() {
    let (_temp_dir, root) = mod_dir();
    write_fixture(&root, "Sample Mod.civ5sln", SOLUTION_FIXTURE);
    let project_path = root.join("Sample Mod.civ5proj");
    let service = ConversionService::default();

    // Already listed: unchanged references
    service.update_solution(&project_path, "Sample Mod").unwrap();
    let solution = service.load_solution(&root.join("Sample Mod.civ5sln")).unwrap();
    assert_eq!(solution.projects.len(), 1);
    assert_eq!(
        solution.projects[0].guid,
        "{0d66d522-b624-4bc5-acfe-15a0c5b729f4}"
    );

    // A solution that does not list the project gets it appended
    let mut two = ModSolution::new("Sample Mod");
    two.projects.push(ProjectReference::new("Other.civ5proj", "Other"));
    fs::write(root.join("Sample Mod.civ5sln"), solution::encode(&two)).unwrap();
    service.update_solution(&project_path, "Sample Mod").unwrap();

    let merged = service.load_solution(&root.join("Sample Mod.civ5sln")).unwrap();
    assert_eq!(merged.projects.len(), 2);
    assert_eq!(merged.projects[0], two.projects[0]);
    assert_eq!(merged.projects[1].path, "Sample Mod.civ5proj");
}

#[test]
fn test_unreadable_solution_is_replaced() {
    let (_temp_dir, root) = mod_dir();
    fs::write(root.join("Sample Mod.civ5sln"), "not a solution").unwrap();
    let service = ConversionService::default();

    service
        .update_solution(&root.join("Sample Mod.civ5proj"), "Sample Mod")
        .unwrap();

    let solution = service.load_solution(&root.join("Sample Mod.civ5sln")).unwrap();
    assert_eq!(solution.name, "Sample Mod");
    assert_eq!(solution.projects.len(), 1);
}

#[test]
fn test_build_project_to_manifest_computes_checksums() {
    let (_temp_dir, root) = mod_dir();
    let input = write_fixture(&root, "Sample Mod.civ5proj", BUILD_PROJECT_FIXTURE);
    fs::create_dir_all(root.join("SQL")).unwrap();
    fs::write(root.join("SQL").join("Buildings.sql"), "").unwrap();

    let service = ConversionService::default();
    let (written, document) = service.build_project_to_manifest(&input, None).unwrap();

    assert_eq!(written, root.join("Sample Mod.modinfo"));
    assert_eq!(document.checksums_computed, 1);
    assert!(document.missing_checksums.is_empty());

    let project = service.load_manifest(&written).unwrap();
    let sql = project
        .files
        .iter()
        .find(|f| f.path == "SQL\\Buildings.sql")
        .unwrap();
    assert_eq!(sql.md5.as_deref(), Some("D41D8CD98F00B204E9800998ECF8427E"));
}

#[test]
fn test_update_checksums_replaces_stale_digest() {
    let (_temp_dir, root) = mod_dir();
    let input = write_fixture(&root, "Sample Mod (v 2).modinfo", MANIFEST_FIXTURE);
    fs::create_dir_all(root.join("Art")).unwrap();
    fs::write(root.join("Art").join("Icon.dds"), "hello world").unwrap();

    let service = ConversionService::default();
    let document = service.update_checksums(&input, None).unwrap();

    assert_eq!(document.checksums_computed, 1);
    assert_eq!(document.missing_checksums, vec!["SQL\\Buildings.sql".to_string()]);
    assert_eq!(service.metrics().checksums_unavailable.load(Ordering::Relaxed), 1);

    let text = fs::read_to_string(&input).unwrap();
    assert!(text.contains(r#"md5="5EB63BBBE01EEED093CB22BB8F5ACDC3""#));
    assert!(!text.contains("0123456789ABCDEF"));
}

#[test]
fn test_validate_dispatches_on_extension() {
    let (_temp_dir, root) = mod_dir();
    let manifest = write_fixture(&root, "Sample Mod (v 2).modinfo", MANIFEST_FIXTURE);
    let project = write_fixture(&root, "Sample Mod.CIV5PROJ", BUILD_PROJECT_FIXTURE);
    let service = ConversionService::default();

    assert_eq!(service.validate(&manifest).unwrap().0, FileKind::Manifest);
    assert_eq!(service.validate(&project).unwrap().0, FileKind::BuildProject);

    let notes = write_fixture(&root, "notes.txt", b"hello");
    let err = service.validate(&notes).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModError>(),
        Some(ModError::UnsupportedExtension(_))
    ));
}

#[test]
fn test_validate_reports_format_errors() {
    let (_temp_dir, root) = mod_dir();
    let broken = write_fixture(&root, "Broken.modinfo", b"<Mod id=\"x\" version=\"1\"></Mod>");
    let service = ConversionService::default();

    let err = service.validate(&broken).unwrap_err();
    assert!(matches!(err.downcast_ref::<ModError>(), Some(ModError::Format(_))));
    assert!(format!("{:#}", err).contains("Broken.modinfo"));

    let err = service.validate(&root.join("Missing.modinfo")).unwrap_err();
    assert!(matches!(err.downcast_ref::<ModError>(), Some(ModError::NotFound(_))));
}

#[test]
fn test_sync_files_adds_untracked_files() {
    let (_temp_dir, root) = mod_dir();
    let input = write_fixture(&root, "Sample Mod (v 2).modinfo", MANIFEST_FIXTURE);
    write_fixture(&root, "Sample Mod.civ5sln", SOLUTION_FIXTURE);
    fs::create_dir_all(root.join("art")).unwrap();
    fs::create_dir_all(root.join("Lua")).unwrap();
    // Already listed as Art\Icon.dds
    fs::write(root.join("art").join("icon.dds"), "x").unwrap();
    fs::write(root.join("Lua").join("New.lua"), "--").unwrap();

    let service = ConversionService::default();
    let report = service.sync_files(&input, None, true).unwrap();

    assert_eq!(report.added, vec!["Lua\\New.lua".to_string()]);
    assert_eq!(report.written.as_deref(), Some(input.as_path()));
    assert_eq!(report.written_elsewhere(&input), None);

    let project = service.load_manifest(&input).unwrap();
    let added = project.files.iter().find(|f| f.path == "Lua\\New.lua").unwrap();
    assert!(added.import_to_vfs);
    assert_eq!(project.files.len(), 5);

    // Second run finds nothing new
    let report = service.sync_files(&input, None, false).unwrap();
    assert!(report.added.is_empty());
    assert_eq!(report.written, None);
}

#[test]
fn test_sync_files_uses_import_setting() {
    let (_temp_dir, root) = mod_dir();
    let input = write_fixture(&root, "Sample Mod.civ5proj", BUILD_PROJECT_FIXTURE);
    fs::write(root.join("Extra.xml"), "<x/>").unwrap();

    let settings = ToolSettings {
        import_new_files: true,
        ..ToolSettings::default()
    };
    let service = ConversionService::new(settings);
    let report = service.sync_files(&input, None, false).unwrap();

    assert_eq!(report.added, vec!["Extra.xml".to_string()]);
    let project = service.load_build_project(&input).unwrap();
    assert!(project.files.iter().any(|f| f.path == "Extra.xml" && f.import_to_vfs));
}

#[test]
fn test_sync_files_reports_renamed_build_project() {
    let (_temp_dir, root) = mod_dir();
    let input = write_fixture(&root, "Renamed.civ5proj", BUILD_PROJECT_FIXTURE);
    fs::write(root.join("Extra.xml"), "<x/>").unwrap();

    let service = ConversionService::default();
    let report = service.sync_files(&input, None, false).unwrap();

    let derived = root.join("Sample Mod.civ5proj");
    assert_eq!(report.written.as_deref(), Some(derived.as_path()));
    assert_eq!(report.written_elsewhere(&input), Some(derived.as_path()));
    assert_eq!(fs::read(&input).unwrap(), BUILD_PROJECT_FIXTURE);
}

#[test]
fn test_unusable_project_name_is_rejected() {
    let (_temp_dir, root) = mod_dir();
    let service = ConversionService::default();

    for name in ["", "../../evil"] {
        let project = ProjectModel::new(name);
        let err = service
            .write_build_project(&project, &root.join("Mod.civ5proj"), true)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModError>(),
            Some(ModError::InvalidProjectName(_))
        ));
    }
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    assert!(!root.join("../../evil.civ5proj").exists());
}
