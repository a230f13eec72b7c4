//! `.civ5proj` build-project codec.
//!
//! An MSBuild project in which every element lives in the MSBuild default
//! namespace. Booleans are written `true`/`false`, and collections are flat
//! lists of elements with one child per field.

use crate::codec::xml::Element;
use crate::error::{ModError, Result};
use crate::models::{
    Action, ActionType, Association, AssociationKind, EntryPoint, FileEntry, ProjectModel,
};
use crate::paths::to_game_path;

/// Namespace of every element in a build project.
pub const MSBUILD_NS: &str = "http://schemas.microsoft.com/developer/msbuild/2003";

pub const EXTENSION: &str = "civ5proj";

const ROOT: &str = "Project";

/// Decode a `.civ5proj` document.
///
/// Only elements in [`MSBUILD_NS`] are considered. Properties come from the
/// first `PropertyGroup` that has a `Name` child; absent flags keep the
/// [`ProjectModel::new`] defaults.
///
/// # Errors
///
/// [`ModError::Format`] if the XML is malformed, the root is not an MSBuild
/// `<Project>`, no property group carries a `Name`, a file entry lacks
/// `ImportIntoVFS`, or an association has an unknown `Type`.
pub fn decode(bytes: &[u8]) -> Result<ProjectModel> {
    let root = Element::parse(bytes)?;
    if root.name != ROOT || root.namespace.as_deref() != Some(MSBUILD_NS) {
        return Err(ModError::format(format!(
            "expected MSBuild <{}> root element, found <{}>",
            ROOT, root.name
        )));
    }

    let props = children(&root, "PropertyGroup")
        .find(|group| child(group, "Name").is_some())
        .ok_or_else(|| ModError::missing("PropertyGroup/Name"))?;

    let mut project = ProjectModel::new(text(props, "Name"));
    if let Some(id) = child(props, "ProjectGuid") {
        project.project_id = id.text.clone();
    }
    if let Some(id) = child(props, "Guid") {
        project.mod_id = id.text.clone();
    }
    if let Some(version) = child(props, "ModVersion") {
        project.version = version.text.clone();
    }
    if let Some(stability) = child(props, "Stability") {
        project.stability = stability.text.clone();
    }
    project.teaser = text(props, "Teaser");
    project.description = text(props, "Description");
    project.authors = text(props, "Authors");
    project.special_thanks = text(props, "SpecialThanks");
    project.homepage = text(props, "Homepage");

    let flags: [(&str, &mut bool); 10] = [
        ("AffectsSavedGames", &mut project.affects_saved_games),
        ("SupportsSinglePlayer", &mut project.supports_single_player),
        ("SupportsMultiplayer", &mut project.supports_multiplayer),
        ("SupportsHotSeat", &mut project.supports_hot_seat),
        ("SupportsMac", &mut project.supports_mac),
        ("HideSetupGame", &mut project.hide_setup_game),
        ("ReloadAudioSystem", &mut project.reload_audio),
        ("ReloadLandmarkSystem", &mut project.reload_landmark),
        ("ReloadStrategicViewSystem", &mut project.reload_strategic_view),
        ("ReloadUnitSystem", &mut project.reload_unit),
    ];
    for (name, field) in flags {
        if let Some(element) = child(props, name) {
            *field = flag_value(&element.text);
        }
    }
    if let Some(min) = child(props, "MinCompatibleSaveVersion") {
        project.set_min_compatible_save_version(min.text.as_str());
    }

    for list in children(&root, "ModDependencies") {
        for association in children(list, "Association") {
            project.dependencies.push(decode_association(association)?);
        }
    }
    for list in children(&root, "ModBlockers") {
        for association in children(list, "Association") {
            project.blockers.push(decode_association(association)?);
        }
    }

    for list in children(&root, "ModActions") {
        for action in children(list, "Action") {
            let type_name = text(action, "Type");
            match type_name.parse::<ActionType>() {
                Ok(action_type) => project.actions.push(Action::new(
                    text(action, "Set"),
                    action_type,
                    to_game_path(&text(action, "FileName")),
                )),
                Err(_) => tracing::warn!("Ignoring unsupported action type {:?}", type_name),
            }
        }
    }

    for group in children(&root, "ItemGroup") {
        for content in children(group, "Content") {
            let Some(include) = content.attribute("Include").filter(|p| !p.is_empty()) else {
                continue;
            };
            let import = child(content, "ImportIntoVFS")
                .ok_or_else(|| ModError::missing(&format!("Content[{}]/ImportIntoVFS", include)))?;
            project.files.push(
                FileEntry::new(to_game_path(include), flag_value(&import.text))
                    .with_subtype(text(content, "SubType")),
            );
        }
    }

    for list in children(&root, "ModContent") {
        for content in children(list, "Content") {
            let mut entry = EntryPoint::new(
                text(content, "Type"),
                to_game_path(&text(content, "FileName")),
            );
            entry.name = text(content, "Name");
            entry.description = text(content, "Description");
            project.entry_points.push(entry);
        }
    }

    tracing::debug!(
        "Decoded build project '{}': {} files, {} actions",
        project.name,
        project.files.len(),
        project.actions.len()
    );
    Ok(project)
}

/// Encode a project as a `.civ5proj` document.
pub fn encode(model: &ProjectModel) -> Result<Vec<u8>> {
    let mut root = Element::new(ROOT)
        .with_attribute("DefaultTargets", "Deploy")
        .with_attribute("ToolsVersion", "4.0")
        .with_attribute("xmlns", MSBUILD_NS);

    let props = root.push(Element::new("PropertyGroup"));
    let text_properties = [
        ("Configuration", "Default"),
        ("ProjectGuid", model.project_id.as_str()),
        ("Name", model.name.as_str()),
        ("Guid", model.mod_id.as_str()),
        ("ModVersion", model.version.as_str()),
        ("Stability", model.stability.as_str()),
        ("Teaser", model.teaser.as_str()),
        ("Description", model.description.as_str()),
        ("Authors", model.authors.as_str()),
        ("SpecialThanks", model.special_thanks.as_str()),
        ("Homepage", model.homepage.as_str()),
        ("AffectsSavedGames", flag_text(model.affects_saved_games)),
        ("MinCompatibleSaveVersion", model.min_compatible_save_version()),
        ("SupportsSinglePlayer", flag_text(model.supports_single_player)),
        ("SupportsMultiplayer", flag_text(model.supports_multiplayer)),
        ("SupportsHotSeat", flag_text(model.supports_hot_seat)),
        ("SupportsMac", flag_text(model.supports_mac)),
        ("HideSetupGame", flag_text(model.hide_setup_game)),
        ("ReloadUnitSystem", flag_text(model.reload_unit)),
        ("ReloadLandmarkSystem", flag_text(model.reload_landmark)),
        ("ReloadStrategicViewSystem", flag_text(model.reload_strategic_view)),
        ("ReloadAudioSystem", flag_text(model.reload_audio)),
    ];
    for (name, value) in text_properties {
        props.push(Element::text_node(name, value));
    }

    if !model.dependencies.is_empty() {
        let list = root.push(Element::new("ModDependencies"));
        for dep in &model.dependencies {
            list.push(encode_association(dep));
        }
    }
    if !model.blockers.is_empty() {
        let list = root.push(Element::new("ModBlockers"));
        for block in &model.blockers {
            list.push(encode_association(block));
        }
    }

    if !model.actions.is_empty() {
        let list = root.push(Element::new("ModActions"));
        for action in &model.actions {
            let element = list.push(Element::new("Action"));
            element.push(Element::text_node("Set", action.action_set.as_str()));
            element.push(Element::text_node("Type", action.action_type.as_str()));
            element.push(Element::text_node("FileName", to_game_path(&action.filename)));
        }
    }

    if !model.files.is_empty() {
        let group = root.push(Element::new("ItemGroup"));
        for file in model.sorted_files() {
            let content = group.push(
                Element::new("Content").with_attribute("Include", to_game_path(&file.path)),
            );
            if !file.subtype.is_empty() {
                content.push(Element::text_node("SubType", file.subtype.as_str()));
            }
            content.push(Element::text_node("ImportIntoVFS", flag_text(file.import_to_vfs)));
        }
    }

    if !model.entry_points.is_empty() {
        let list = root.push(Element::new("ModContent"));
        for ep in &model.entry_points {
            let content = list.push(Element::new("Content"));
            content.push(Element::text_node("Type", ep.entry_type.as_str()));
            if !ep.name.is_empty() {
                content.push(Element::text_node("Name", ep.name.as_str()));
            }
            if !ep.description.is_empty() {
                content.push(Element::text_node("Description", ep.description.as_str()));
            }
            content.push(Element::text_node("FileName", to_game_path(&ep.file)));
        }
    }

    root.to_document()
}

/// Project base name derived from a display name.
///
/// Drops everything from the first `" (v "` on and a leading `"(1) "`, so
/// `"(1) Better Trade (v 3)"` becomes `"Better Trade"`.
pub fn base_name(display_name: &str) -> &str {
    let without_version = display_name
        .split(" (v ")
        .next()
        .unwrap_or(display_name);
    without_version
        .strip_prefix("(1) ")
        .unwrap_or(without_version)
}

/// File name a project is written under, whatever the caller asked for.
///
/// # Errors
///
/// [`ModError::InvalidProjectName`] when the base name is blank or contains a
/// path separator, since the result would not be a sibling of the request.
pub fn output_file_name(model: &ProjectModel) -> Result<String> {
    let base = base_name(&model.name);
    if base.trim().is_empty() || base.contains(['/', '\\']) {
        return Err(ModError::InvalidProjectName(model.name.clone()));
    }
    Ok(format!("{}.{}", base, EXTENSION))
}

fn decode_association(element: &Element) -> Result<Association> {
    let kind: AssociationKind = text(element, "Type").parse()?;
    let mut association = Association::new(kind);
    association.name = text(element, "Name");
    association.id = child(element, "Id")
        .map(|e| e.text.clone())
        .filter(|id| !id.is_empty());
    if let Some(min) = child(element, "MinVersion") {
        association.min_version = min.text.clone();
    }
    if let Some(max) = child(element, "MaxVersion") {
        association.max_version = max.text.clone();
    }
    Ok(association)
}

fn encode_association(association: &Association) -> Element {
    let mut element = Element::new("Association");
    element.push(Element::text_node("Type", association.kind.as_str()));
    element.push(Element::text_node("Name", association.name.as_str()));
    element.push(Element::text_node(
        "Id",
        association.id.clone().unwrap_or_default(),
    ));
    element.push(Element::text_node("MinVersion", association.min_version.as_str()));
    element.push(Element::text_node("MaxVersion", association.max_version.as_str()));
    element
}

fn child<'a>(parent: &'a Element, name: &str) -> Option<&'a Element> {
    parent.child_in(Some(MSBUILD_NS), name)
}

fn children<'a>(parent: &'a Element, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
    parent.children_in(Some(MSBUILD_NS), name)
}

fn text(parent: &Element, name: &str) -> String {
    child(parent, name).map(|e| e.text.clone()).unwrap_or_default()
}

fn flag_value(text: &str) -> bool {
    text.eq_ignore_ascii_case("true")
}

fn flag_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
