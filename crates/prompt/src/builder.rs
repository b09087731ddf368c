//! Prompt builder for rendering grounding templates.

use crate::types::{BuiltPrompt, ContextPassage, PromptDefinition};
use handlebars::Handlebars;
use ragdesk_core::{AppError, AppResult};
use std::collections::HashMap;

/// Render passages as the context block: `[<label>: <source>]\n<text>`,
/// separated by blank lines.
pub fn render_context(label: &str, passages: &[ContextPassage]) -> String {
    passages
        .iter()
        .map(|p| format!("[{}: {}]\n{}", label, p.source, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build a grounding prompt from a definition, the user query and the
/// retrieved passages.
///
/// # Example
/// ```no_run
/// use ragdesk_prompt::{build_prompt, builtin_prompt, ContextPassage};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = builtin_prompt("en")?;
/// let passages = vec![ContextPassage::new("warranty.pdf", "Roof warranty: 10 years")];
/// let built = build_prompt(&def, "What are the warranty terms?", &passages)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    query: &str,
    passages: &[ContextPassage],
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        prompt_id = %definition.id,
        passages = passages.len(),
        "Building prompt"
    );

    let mut variables = HashMap::new();
    variables.insert("query".to_string(), query.to_string());
    variables.insert(
        "context".to_string(),
        render_context(&definition.source_label, passages),
    );
    variables.insert("language".to_string(), definition.language.clone());

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        definition.system.clone(),
        user,
        definition.id.clone(),
        passages.len(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
