//! Prompt loader: built-in grounding prompts and YAML overrides.

use crate::types::PromptDefinition;
use ragdesk_core::{AppError, AppResult};
use std::path::Path;

const GROUNDING_JA: &str = include_str!("../prompts/grounding.ja.yml");
const GROUNDING_EN: &str = include_str!("../prompts/grounding.en.yml");

/// The built-in grounding prompt for a language.
pub fn builtin_prompt(language: &str) -> AppResult<PromptDefinition> {
    let source = match language {
        "ja" => GROUNDING_JA,
        "en" => GROUNDING_EN,
        other => {
            return Err(AppError::Prompt(format!(
                "No built-in prompt for language: {}",
                other
            )))
        }
    };

    let definition = parse_prompt(source, "built-in")?;
    validate_prompt(&definition)?;
    Ok(definition)
}

/// Load a prompt definition from a YAML file.
///
/// # Example
/// ```no_run
/// use ragdesk_prompt::load_prompt_file;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt_file(Path::new(".ragdesk/prompts/grounding.yml"))?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt_file(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            path
        )));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e))
    })?;

    let definition = parse_prompt(&contents, &path.display().to_string())?;
    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Resolve the grounding prompt: an explicit file wins over the built-in
/// prompt for `language`.
pub fn resolve_prompt(language: &str, prompt_file: Option<&Path>) -> AppResult<PromptDefinition> {
    match prompt_file {
        Some(path) => load_prompt_file(path),
        None => builtin_prompt(language),
    }
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    // Both slots are required.
    for slot in ["{{query}}", "{{context}}"] {
        if !def.template.contains(slot) {
            return Err(AppError::Prompt(format!(
                "Prompt {} is missing the {} placeholder",
                def.id, slot
            )));
        }
    }

    Ok(())
}
