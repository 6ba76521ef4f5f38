//! Handlebars templating collaborator.

use std::io;
use std::path::Path;

use handlebars::{Handlebars, RenderError, RenderErrorReason};
use serde_json::Value;

use super::TemplateRenderer;
use crate::error::TemplateError;

/// Renders `<root>/<template>` with Handlebars.
///
/// Strict mode is on by default, so a variable missing from the host
/// context is an error rather than an empty string. Output is not
/// HTML-escaped.
#[derive(Debug, Clone, Copy)]
pub struct HandlebarsRenderer {
    strict: bool,
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self { strict: true }
    }
}

impl HandlebarsRenderer {
    /// Create a strict renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, template: &str, root: &Path, context: &Value) -> Result<String, TemplateError> {
        let path = root.join(template);
        let source = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TemplateError::NotFound(path.display().to_string()),
            _ => TemplateError::Other(format!("{}: {}", path.display(), e)),
        })?;

        let mut registry = Handlebars::new();
        registry.set_strict_mode(self.strict);
        registry.register_escape_fn(handlebars::no_escape);
        registry
            .register_template_string(template, source)
            .map_err(|e| TemplateError::Syntax(e.to_string()))?;

        registry.render(template, context).map_err(classify)
    }
}

fn classify(err: RenderError) -> TemplateError {
    match err.reason() {
        RenderErrorReason::MissingVariable(_) => TemplateError::UndefinedVariable(err.to_string()),
        RenderErrorReason::TemplateNotFound(_) | RenderErrorReason::PartialNotFound(_) => {
            TemplateError::NotFound(err.to_string())
        }
        RenderErrorReason::TemplateError(_) => TemplateError::Syntax(err.to_string()),
        _ => TemplateError::Template(err.to_string()),
    }
}
