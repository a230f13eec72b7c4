//! `.modinfo` runtime manifest codec.
//!
//! The manifest is the descriptor the game itself reads. Booleans are written
//! as `1`/`0`, and actions are nested two levels deep: an element named after
//! the action set containing elements named after the action type.
//!
//! ```text
//! <Mod id="{...}" version="3">
//!   <Properties>...</Properties>
//!   <Dependencies><Game minversion="0" maxversion="999"/></Dependencies>
//!   <References/>
//!   <Files><File md5="..." import="1">Lua\Main.lua</File></Files>
//!   <Actions><OnModActivated><UpdateDatabase>SQL\Init.sql</UpdateDatabase></OnModActivated></Actions>
//! </Mod>
//! ```

use crate::checksum::{ChecksumSource, DirectoryChecksums};
use crate::codec::xml::Element;
use crate::error::{ModError, Result};
use crate::models::{
    Action, ActionType, Association, AssociationKind, EntryPoint, FileEntry, ProjectModel,
};
use crate::paths::to_game_path;
use camino::Utf8Path;
use indexmap::IndexMap;

const ROOT: &str = "Mod";

/// Encoded manifest plus what happened to checksums along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDocument {
    pub xml: Vec<u8>,
    pub checksums_computed: usize,
    /// Game paths of imported files whose digest could not be computed
    pub missing_checksums: Vec<String>,
}

/// Decode a `.modinfo` document.
///
/// # Errors
///
/// [`ModError::Format`] if the XML is malformed, the root is not `<Mod>`, the
/// root lacks `id`/`version`, or a required `Properties` child is missing.
/// No partial model is returned.
pub fn decode(bytes: &[u8]) -> Result<ProjectModel> {
    let root = Element::parse(bytes)?;
    if root.name != ROOT || root.namespace.is_some() {
        return Err(ModError::format(format!(
            "expected <{}> root element, found <{}>",
            ROOT, root.name
        )));
    }

    let props = root
        .child("Properties")
        .ok_or_else(|| ModError::missing("Properties"))?;

    let mut project = ProjectModel::new(required_text(props, "Name")?);
    project.mod_id = required_attribute(&root, "id")?.to_string();
    project.version = required_attribute(&root, "version")?.to_string();
    project.teaser = required_text(props, "Teaser")?;
    project.description = required_text(props, "Description")?;
    project.authors = required_text(props, "Authors")?;
    project.homepage = props
        .child("Homepage")
        .map(|e| e.text.clone())
        .unwrap_or_default();

    project.supports_single_player = required_flag(props, "SupportsSinglePlayer")?;
    project.supports_multiplayer = required_flag(props, "SupportsMultiplayer")?;
    project.supports_hot_seat = required_flag(props, "SupportsHotSeat")?;
    project.supports_mac = required_flag(props, "SupportsMac")?;

    project.affects_saved_games = required_flag(props, "AffectsSavedGames")?;
    project.set_min_compatible_save_version(required_text(props, "MinCompatibleSaveVersion")?);
    project.hide_setup_game = props
        .child("HideSetupGame")
        .map(|e| flag_value(&e.text))
        .unwrap_or(false);
    project.reload_audio = required_flag(props, "ReloadAudioSystem")?;
    project.reload_landmark = required_flag(props, "ReloadLandmarkSystem")?;
    project.reload_strategic_view = required_flag(props, "ReloadStrategicViewSystem")?;
    project.reload_unit = required_flag(props, "ReloadUnitSystem")?;

    if let Some(deps) = root.child("Dependencies") {
        if let Some(game) = deps.child("Game") {
            project
                .dependencies
                .push(association_from(AssociationKind::Game, game));
        }
        for dlc in deps.children_named("Dlc") {
            project
                .dependencies
                .push(association_from(AssociationKind::Dlc, dlc));
        }
    }

    if let Some(blocks) = root.child("Blocks") {
        for blocked in blocks.children_named("Mod") {
            let mut association = association_from(AssociationKind::Mod, blocked);
            association.name = blocked.attribute("title").unwrap_or_default().to_string();
            project.blockers.push(association);
        }
    }

    if let Some(files) = root.child("Files") {
        for file in files.children_named("File") {
            project.files.push(FileEntry {
                md5: file.attribute("md5").map(str::to_string),
                ..FileEntry::new(to_game_path(&file.text), file.attribute("import") == Some("1"))
            });
        }
    }

    if let Some(actions) = root.child("Actions") {
        for set in &actions.children {
            for action in &set.children {
                match action.name.parse::<ActionType>() {
                    Ok(action_type) => project.actions.push(Action::new(
                        set.name.as_str(),
                        action_type,
                        to_game_path(&action.text),
                    )),
                    Err(_) => tracing::warn!(
                        "Ignoring unsupported action <{}> in <{}>",
                        action.name,
                        set.name
                    ),
                }
            }
        }
    }

    if let Some(entry_points) = root.child("EntryPoints") {
        for ep in entry_points.children_named("EntryPoint") {
            let mut entry = EntryPoint::new(
                ep.attribute("type").unwrap_or_default(),
                to_game_path(ep.attribute("file").unwrap_or_default()),
            );
            entry.name = ep.child("Name").map(|e| e.text.clone()).unwrap_or_default();
            entry.description = ep
                .child("Description")
                .map(|e| e.text.clone())
                .unwrap_or_default();
            project.entry_points.push(entry);
        }
    }

    tracing::debug!(
        "Decoded manifest '{}' v{}: {} files, {} actions",
        project.name,
        project.version,
        project.files.len(),
        project.actions.len()
    );
    Ok(project)
}

/// Encode a manifest, computing checksums for imported files under `base_path`.
pub fn encode(model: &ProjectModel, base_path: &Utf8Path) -> Result<ManifestDocument> {
    encode_with(model, &DirectoryChecksums::new(base_path))
}

/// Encode a manifest with checksums from an arbitrary source.
///
/// A file whose checksum is unavailable is written without an `md5`
/// attribute and reported in [`ManifestDocument::missing_checksums`].
pub fn encode_with<C: ChecksumSource + ?Sized>(
    model: &ProjectModel,
    checksums: &C,
) -> Result<ManifestDocument> {
    let mut root = Element::new(ROOT)
        .with_attribute("id", model.mod_id.as_str())
        .with_attribute("version", model.version.as_str());

    root.push(properties_element(model));

    let runtime_dependencies: Vec<&Association> = model
        .dependencies
        .iter()
        .filter(|d| matches!(d.kind, AssociationKind::Game | AssociationKind::Dlc))
        .collect();
    if !runtime_dependencies.is_empty() {
        let deps = root.push(Element::new("Dependencies"));
        for dep in runtime_dependencies {
            let mut element = Element::new(dep.kind.as_str());
            if dep.kind == AssociationKind::Dlc {
                element = element.with_attribute("id", dep.id.clone().unwrap_or_default());
            }
            deps.push(
                element
                    .with_attribute("minversion", dep.min_version.as_str())
                    .with_attribute("maxversion", dep.max_version.as_str()),
            );
        }
    }

    // Always present, the game expects it even when empty
    root.push(Element::new("References"));

    let mod_blockers: Vec<&Association> = model
        .blockers
        .iter()
        .filter(|b| b.kind == AssociationKind::Mod)
        .collect();
    if !mod_blockers.is_empty() {
        let blocks = root.push(Element::new("Blocks"));
        for block in mod_blockers {
            blocks.push(
                Element::new("Mod")
                    .with_attribute("id", block.id.clone().unwrap_or_default())
                    .with_attribute("minversion", block.min_version.as_str())
                    .with_attribute("maxversion", block.max_version.as_str())
                    .with_attribute("title", block.name.as_str()),
            );
        }
    }

    let mut checksums_computed = 0;
    let mut missing_checksums = Vec::new();
    if !model.files.is_empty() {
        let files = root.push(Element::new("Files"));
        for file in model.sorted_files() {
            let game_path = to_game_path(&file.path);
            let mut element = Element::new("File");

            if file.import_to_vfs {
                match checksums.checksum(&game_path) {
                    Ok(digest) => {
                        element = element.with_attribute("md5", digest);
                        checksums_computed += 1;
                    }
                    Err(e) => {
                        tracing::warn!("No checksum for {}: {}", game_path, e);
                        missing_checksums.push(game_path.clone());
                    }
                }
            }

            files.push(
                element
                    .with_attribute("import", flag_text(file.import_to_vfs))
                    .with_text(game_path),
            );
        }
    }

    if !model.actions.is_empty() {
        let mut sets: IndexMap<&str, Vec<&Action>> = IndexMap::new();
        for action in &model.actions {
            sets.entry(action.action_set.as_str())
                .or_default()
                .push(action);
        }

        let actions = root.push(Element::new("Actions"));
        for (set_name, set_actions) in sets {
            let set = actions.push(Element::new(set_name));
            for action in set_actions {
                set.push(Element::text_node(
                    action.action_type.as_str(),
                    to_game_path(&action.filename),
                ));
            }
        }
    }

    if !model.entry_points.is_empty() {
        let entry_points = root.push(Element::new("EntryPoints"));
        for ep in &model.entry_points {
            let element = entry_points.push(
                Element::new("EntryPoint")
                    .with_attribute("type", ep.entry_type.as_str())
                    .with_attribute("file", to_game_path(&ep.file)),
            );
            if !ep.name.is_empty() {
                element.push(Element::text_node("Name", ep.name.as_str()));
            }
            if !ep.description.is_empty() {
                element.push(Element::text_node("Description", ep.description.as_str()));
            }
        }
    }

    tracing::debug!(
        "Encoded manifest '{}': {} checksums computed, {} unavailable",
        model.name,
        checksums_computed,
        missing_checksums.len()
    );

    Ok(ManifestDocument {
        xml: root.to_document()?,
        checksums_computed,
        missing_checksums,
    })
}

fn properties_element(model: &ProjectModel) -> Element {
    let mut props = Element::new("Properties");
    props.push(Element::text_node("Name", model.name.as_str()));
    props.push(Element::text_node("Teaser", model.teaser.as_str()));
    props.push(Element::text_node("Description", model.description.as_str()));
    props.push(Element::text_node("Authors", model.authors.as_str()));
    if !model.homepage.is_empty() {
        props.push(Element::text_node("Homepage", model.homepage.as_str()));
    }

    let flags = [
        ("SupportsSinglePlayer", model.supports_single_player),
        ("SupportsMultiplayer", model.supports_multiplayer),
        ("SupportsHotSeat", model.supports_hot_seat),
        ("SupportsMac", model.supports_mac),
        ("AffectsSavedGames", model.affects_saved_games),
    ];
    for (name, value) in flags {
        props.push(Element::text_node(name, flag_text(value)));
    }

    props.push(Element::text_node(
        "MinCompatibleSaveVersion",
        model.min_compatible_save_version(),
    ));

    let system_flags = [
        ("HideSetupGame", model.hide_setup_game),
        ("ReloadAudioSystem", model.reload_audio),
        ("ReloadLandmarkSystem", model.reload_landmark),
        ("ReloadStrategicViewSystem", model.reload_strategic_view),
        ("ReloadUnitSystem", model.reload_unit),
    ];
    for (name, value) in system_flags {
        props.push(Element::text_node(name, flag_text(value)));
    }

    props
}

fn association_from(kind: AssociationKind, element: &Element) -> Association {
    let mut association = Association::new(kind);
    association.id = element.attribute("id").map(str::to_string);
    if let Some(min) = element.attribute("minversion") {
        association.min_version = min.to_string();
    }
    if let Some(max) = element.attribute("maxversion") {
        association.max_version = max.to_string();
    }
    association
}

fn required_attribute<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element
        .attribute(name)
        .ok_or_else(|| ModError::missing(&format!("{}@{}", element.name, name)))
}

fn required_text(parent: &Element, name: &str) -> Result<String> {
    parent
        .child(name)
        .map(|e| e.text.clone())
        .ok_or_else(|| ModError::missing(&format!("{}/{}", parent.name, name)))
}

fn required_flag(parent: &Element, name: &str) -> Result<bool> {
    required_text(parent, name).map(|text| flag_value(&text))
}

fn flag_value(text: &str) -> bool {
    text == "1"
}

fn flag_text(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}
