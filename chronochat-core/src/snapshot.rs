//! Scene snapshots: image prompts, share lines, and saved files.

use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::context::{self, ContextError};
use crate::selection::{ActiveSelection, ChatTarget};
use chrono::Local;
use gemini::GeneratedImage;
use tokio::fs;

const STYLE_SUFFIX: &str =
    "The scene should be evocative of the era. Style: vibrant digital painting, atmospheric, \
     detailed.";

/// Build the image prompt for the current scene.
pub fn scene_prompt(
    catalog: &Catalog,
    selection: &ActiveSelection,
) -> Result<String, ContextError> {
    let era = catalog
        .era(&selection.era_id)
        .ok_or_else(|| ContextError::EraNotFound(selection.era_id.clone()))?;
    let role = era
        .role(&selection.role_id)
        .ok_or_else(|| ContextError::RoleNotFound(selection.role_id.clone()))?;

    let target_name = match &selection.target {
        ChatTarget::Group => format!("the {} and other participants", context::guide_name(era)),
        ChatTarget::Persona { id } if id == crate::catalog::GENERAL_ERA_AI => {
            context::guide_name(era)
        }
        ChatTarget::Persona { id } => era
            .persona(id)
            .ok_or_else(|| ContextError::PersonaNotFound(id.clone()))?
            .name
            .clone(),
        ChatTarget::Mock { id } => {
            let mock = era
                .mock(id)
                .ok_or_else(|| ContextError::MockNotFound(id.clone()))?;
            format!("{} (as {})", mock.name, context::mock_role_name(era, mock))
        }
    };

    Ok(format!(
        "A time traveler (as a {}) interacting with {} amidst {}. {}",
        role.name,
        target_name,
        era.visual_subject(),
        STYLE_SUFFIX
    ))
}

/// Build the shareable one-liner for a taken snapshot.
pub fn share_line(catalog: &Catalog, selection: &ActiveSelection) -> Result<String, ContextError> {
    let era = catalog
        .era(&selection.era_id)
        .ok_or_else(|| ContextError::EraNotFound(selection.era_id.clone()))?;
    let role = era
        .role(&selection.role_id)
        .ok_or_else(|| ContextError::RoleNotFound(selection.role_id.clone()))?;

    let mut interaction = format!("as a {}", role.name);
    match &selection.target {
        ChatTarget::Group => {
            interaction.push_str(&format!(" in the {} group chat", era.name));
        }
        ChatTarget::Persona { id } if id == crate::catalog::GENERAL_ERA_AI => {
            interaction.push_str(&format!(" with {}", context::guide_name(era)));
        }
        ChatTarget::Persona { id } => {
            let persona = era
                .persona(id)
                .ok_or_else(|| ContextError::PersonaNotFound(id.clone()))?;
            interaction.push_str(&format!(" with {}", persona.name));
        }
        ChatTarget::Mock { id } => {
            let mock = era
                .mock(id)
                .ok_or_else(|| ContextError::MockNotFound(id.clone()))?;
            interaction.push_str(&format!(" with {}", mock.name));
        }
    }

    Ok(format!(
        "I just took a virtual snapshot in {} {} on ChronoChat! #ChronoChat #{}",
        era.name, interaction, selection.era_id
    ))
}

/// Title line for the snapshot view.
pub fn modal_title(era_name: &str) -> String {
    format!("Snapshot from {era_name}!")
}

/// Write the image under `dir` with a timestamped name and return the path.
pub async fn save_snapshot(
    dir: impl AsRef<Path>,
    era_id: &str,
    image: &GeneratedImage,
) -> Result<PathBuf, std::io::Error> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).await?;

    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!(
        "{era_id}-{stamp}.{}",
        extension_for_mime(&image.mime_type)
    ));
    fs::write(&path, &image.bytes).await?;
    Ok(path)
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        _ => "jpg",
    }
}
