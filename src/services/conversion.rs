use crate::codec::{FileKind, ManifestDocument, build_project, manifest, solution};
use crate::error::ModError;
use crate::metrics::Metrics;
use crate::models::{FileEntry, ModSolution, ProjectModel, ToolSettings};
use crate::paths;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Result of adding untracked files to a descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Game paths of the new file entries, in listing order
    pub added: Vec<String>,
    /// Where the descriptor was written; `None` when nothing was added
    pub written: Option<Utf8PathBuf>,
}

impl SyncReport {
    /// The written file when it is not `descriptor` itself.
    ///
    /// Build projects are always written under their derived name, so syncing
    /// a renamed `.civ5proj` leaves the original untouched.
    pub fn written_elsewhere(&self, descriptor: &Utf8Path) -> Option<&Utf8Path> {
        self.written
            .as_deref()
            .filter(|written| written.file_name() != descriptor.file_name())
    }
}

/// File-level operations over the codecs.
///
/// Each operation reads whole files, runs one codec, and writes whole files.
/// Nothing is cached between calls.
#[derive(Debug, Default)]
pub struct ConversionService {
    settings: ToolSettings,
    metrics: Metrics,
}

impl ConversionService {
    /// Service with the given settings and fresh counters.
    pub fn new(settings: ToolSettings) -> Self {
        Self {
            settings,
            metrics: Metrics::new(),
        }
    }

    /// Counters for everything this service has read and written.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Read and decode a `.modinfo` manifest.
    ///
    /// # Errors
    ///
    /// [`ModError::NotFound`] for a missing file, [`ModError::Format`] for a
    /// malformed one, both wrapped with the path as context.
    pub fn load_manifest(&self, path: &Utf8Path) -> Result<ProjectModel> {
        let bytes = self.read_input(path)?;
        manifest::decode(&bytes).with_context(|| format!("Failed to parse manifest: {}", path))
    }

    /// Read and decode a `.civ5proj` build project.
    pub fn load_build_project(&self, path: &Utf8Path) -> Result<ProjectModel> {
        let bytes = self.read_input(path)?;
        build_project::decode(&bytes)
            .with_context(|| format!("Failed to parse build project: {}", path))
    }

    /// Load a manifest or build project, chosen by extension.
    pub fn load_project(&self, path: &Utf8Path) -> Result<(FileKind, ProjectModel)> {
        let kind = FileKind::from_path(path)?;
        let project = match kind {
            FileKind::Manifest => self.load_manifest(path)?,
            FileKind::BuildProject => self.load_build_project(path)?,
            FileKind::Solution => {
                return Err(ModError::UnsupportedExtension(format!(".{}", kind.extension())).into());
            }
        };
        Ok((kind, project))
    }

    /// Read and decode a `.civ5sln` solution, which must be UTF-8.
    pub fn load_solution(&self, path: &Utf8Path) -> Result<ModSolution> {
        let bytes = self.read_input(path)?;
        let text = String::from_utf8(bytes)
            .with_context(|| format!("Solution is not valid UTF-8: {}", path))?;
        solution::decode(&text).with_context(|| format!("Failed to parse solution: {}", path))
    }

    /// Write a manifest, looking up checksummed files under `base_path`
    /// (the output's directory when `None`).
    pub fn write_manifest(
        &self,
        project: &ProjectModel,
        output: &Utf8Path,
        base_path: Option<&Utf8Path>,
    ) -> Result<ManifestDocument> {
        let base_path = base_path.unwrap_or_else(|| parent_dir(output));
        let document = manifest::encode(project, base_path)
            .with_context(|| format!("Failed to encode manifest for '{}'", project.name))?;

        for missing in &document.missing_checksums {
            tracing::warn!(
                "File not found under {}, md5 omitted: {}",
                base_path,
                missing
            );
        }

        self.write_output(output, &document.xml)?;
        self.metrics
            .record_checksums(document.checksums_computed, document.missing_checksums.len());
        tracing::info!("Wrote manifest {}", output);
        Ok(document)
    }

    /// Write a build project next to `requested` and return the path actually used.
    ///
    /// The file name always comes from the project's display name, see
    /// [`build_project::output_file_name`]. With `create_solution`, the
    /// matching `.civ5sln` is created or updated as well.
    pub fn write_build_project(
        &self,
        project: &ProjectModel,
        requested: &Utf8Path,
        create_solution: bool,
    ) -> Result<Utf8PathBuf> {
        let output = parent_dir(requested).join(build_project::output_file_name(project)?);
        if output.file_name() != requested.file_name() {
            tracing::info!(
                "Build project name is derived from '{}', writing {} instead of {}",
                project.name,
                output,
                requested
            );
        }

        let bytes = build_project::encode(project)
            .with_context(|| format!("Failed to encode build project for '{}'", project.name))?;
        self.write_output(&output, &bytes)?;
        tracing::info!("Wrote build project {}", output);

        if create_solution {
            self.update_solution(&output, &project.name)?;
        }
        Ok(output)
    }

    /// Create or update the `.civ5sln` that sits beside a build project.
    ///
    /// An unreadable existing solution is replaced by a fresh one.
    pub fn update_solution(&self, project_path: &Utf8Path, project_name: &str) -> Result<Utf8PathBuf> {
        let solution_path = project_path.with_extension(solution::EXTENSION);
        let project_file_name = project_path
            .file_name()
            .ok_or_else(|| ModError::InvalidPath(project_path.to_string()))?;

        let existing = if solution_path.exists() {
            match self.load_solution(&solution_path) {
                Ok(existing) => Some(existing),
                Err(e) => {
                    tracing::warn!("Replacing unreadable solution {}: {:#}", solution_path, e);
                    None
                }
            }
        } else {
            None
        };

        let merged = solution::merge_or_create(existing, project_file_name, project_name);
        self.write_output(&solution_path, solution::encode(&merged).as_bytes())?;
        self.metrics.record_solution_updated();
        tracing::info!("Wrote solution {}", solution_path);
        Ok(solution_path)
    }

    /// Convert a manifest to a build project; returns the written path.
    pub fn manifest_to_build_project(
        &self,
        input: &Utf8Path,
        output: Option<&Utf8Path>,
        create_solution: bool,
    ) -> Result<Utf8PathBuf> {
        let project = self.load_manifest(input)?;
        let requested = output
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension(build_project::EXTENSION));
        self.write_build_project(
            &project,
            &requested,
            create_solution && self.settings.create_solution,
        )
    }

    /// Convert a build project to a manifest, checksumming files under the
    /// build project's directory.
    pub fn build_project_to_manifest(
        &self,
        input: &Utf8Path,
        output: Option<&Utf8Path>,
    ) -> Result<(Utf8PathBuf, ManifestDocument)> {
        let project = self.load_build_project(input)?;
        let output = output
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|| input.with_extension(crate::codec::MANIFEST_EXTENSION));
        let document = self.write_manifest(&project, &output, Some(parent_dir(input)))?;
        Ok((output, document))
    }

    /// Decode a manifest or build project and report what it holds.
    pub fn validate(&self, path: &Utf8Path) -> Result<(FileKind, ProjectModel)> {
        let (kind, project) = self.load_project(path)?;
        tracing::info!(
            "{} is a valid {}: '{}' v{}, {} files, {} actions",
            path,
            kind,
            project.name,
            project.version,
            project.files.len(),
            project.actions.len()
        );
        Ok((kind, project))
    }

    /// Rewrite a manifest with freshly computed checksums.
    pub fn update_checksums(&self, input: &Utf8Path, output: Option<&Utf8Path>) -> Result<ManifestDocument> {
        let project = self.load_manifest(input)?;
        let output = output.unwrap_or(input);
        self.write_manifest(&project, output, Some(parent_dir(input)))
    }

    /// Add every untracked file under the mod directory to a descriptor.
    ///
    /// `directory` defaults to the descriptor's own directory. Descriptor
    /// files (`.modinfo`, `.civ5proj`, `.civ5sln`) are never added.
    pub fn sync_files(
        &self,
        descriptor: &Utf8Path,
        directory: Option<&Utf8Path>,
        import: bool,
    ) -> Result<SyncReport> {
        let (kind, mut project) = self.load_project(descriptor)?;
        let directory = directory.unwrap_or_else(|| parent_dir(descriptor));
        let import = import || self.settings.import_new_files;

        let listed = paths::list_files(directory)
            .with_context(|| format!("Failed to list files in {}", directory))?;

        let mut report = SyncReport::default();
        for game_path in listed {
            if FileKind::from_path(Utf8Path::new(&game_path)).is_ok() {
                continue;
            }
            if project.contains_file(&game_path) {
                continue;
            }
            tracing::debug!("Adding {} (import={})", game_path, import);
            project.files.push(FileEntry::new(game_path.as_str(), import));
            report.added.push(game_path);
        }

        if report.added.is_empty() {
            tracing::info!("{} already lists every file in {}", descriptor, directory);
            return Ok(report);
        }

        let written = match kind {
            FileKind::Manifest => {
                self.write_manifest(&project, descriptor, Some(directory))?;
                descriptor.to_path_buf()
            }
            _ => self.write_build_project(&project, descriptor, false)?,
        };
        tracing::info!("Added {} file(s) to {}", report.added.len(), written);
        report.written = Some(written);
        if let Some(elsewhere) = report.written_elsewhere(descriptor) {
            tracing::warn!(
                "{} was left unchanged; the updated project is {}",
                descriptor,
                elsewhere
            );
        }
        Ok(report)
    }

    fn read_input(&self, path: &Utf8Path) -> Result<Vec<u8>> {
        if !path.is_file() {
            return Err(ModError::NotFound(path.to_path_buf()).into());
        }
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path))?;
        self.metrics.record_document_read();
        Ok(bytes)
    }

    fn write_output(&self, path: &Utf8Path, bytes: &[u8]) -> Result<()> {
        fs::write(path, bytes).with_context(|| format!("Failed to write {}", path))?;
        self.metrics.record_document_written();
        Ok(())
    }
}

/// Directory containing `path`; `.` for a bare file name.
fn parent_dir(path: &Utf8Path) -> &Utf8Path {
    match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Utf8Path::new("a/b/Mod.modinfo")), Utf8Path::new("a/b"));
        assert_eq!(parent_dir(Utf8Path::new("Mod.modinfo")), Utf8Path::new("."));
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let service = ConversionService::default();
        let err = service
            .load_manifest(Utf8Path::new("definitely/missing.modinfo"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModError>(),
            Some(ModError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_project_rejects_other_kinds() {
        let service = ConversionService::default();

        let err = service.load_project(Utf8Path::new("notes.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModError>(),
            Some(ModError::UnsupportedExtension(_))
        ));

        let err = service.load_project(Utf8Path::new("Mod.civ5sln")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModError>(),
            Some(ModError::UnsupportedExtension(_))
        ));
    }
}
