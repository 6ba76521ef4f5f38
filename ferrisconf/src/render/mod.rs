//! Intended configuration rendering.
//!
//! [`ConfigRenderer`] hands a template name, template root and host context
//! to a [`TemplateRenderer`] and persists the result. Template failures are
//! host-scoped; anything outside the template vocabulary is fatal.

mod hbs;

pub use hbs::HandlebarsRenderer;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, FatalError, HostError, Result, TemplateError};
use crate::host::Host;
use crate::report::{Reporter, fail};
use crate::storage::{Storage, persist};

/// Templating collaborator.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` (relative to `root`) with `context`.
    fn render(&self, template: &str, root: &Path, context: &Value) -> std::result::Result<String, TemplateError>;
}

/// A rendered intended configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedConfig {
    /// Rendered text, as written to disk.
    pub text: String,

    /// Where the text was written.
    pub path: PathBuf,
}

/// Renders and persists intended configurations.
#[derive(Clone)]
pub struct ConfigRenderer {
    renderer: Arc<dyn TemplateRenderer>,
    storage: Arc<dyn Storage>,
    reporter: Arc<dyn Reporter>,
}

impl ConfigRenderer {
    /// Create a config renderer.
    pub fn new(
        renderer: Arc<dyn TemplateRenderer>,
        storage: Arc<dyn Storage>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            renderer,
            storage,
            reporter,
        }
    }

    /// Render `template` for `host` and write it to `output_path`.
    pub async fn generate_config(
        &self,
        host: &Host,
        template: &str,
        template_root: &Path,
        output_path: &Path,
    ) -> Result<RenderedConfig> {
        self.reporter.log_debug(&format!(
            "Executing generate_config for {} with template {}",
            host.name, template
        ));

        // Rendering reads template files; keep it off the async workers.
        let renderer = self.renderer.clone();
        let name = template.to_string();
        let root = template_root.to_path_buf();
        let context = host.template_context();
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&name, &root, &context))
            .await
            .map_err(|e| self.fail(host, FatalError::Renderer(e.to_string())))?
            .map_err(|e| self.fail(host, classify(e)))?;

        persist(self.storage.as_ref(), output_path, &rendered)
            .await
            .map_err(|e| self.fail(host, e))?;

        Ok(RenderedConfig {
            text: rendered,
            path: output_path.to_path_buf(),
        })
    }

    fn fail(&self, host: &Host, err: impl Into<Error>) -> Error {
        fail(self.reporter.as_ref(), &host.name, err)
    }
}

fn classify(err: TemplateError) -> Error {
    match err {
        TemplateError::UndefinedVariable(msg) => HostError::UndefinedVariable(msg).into(),
        TemplateError::Syntax(msg) => HostError::TemplateSyntax(msg).into(),
        TemplateError::NotFound(msg) => HostError::TemplateNotFound(msg).into(),
        TemplateError::Template(msg) => HostError::Template(msg).into(),
        TemplateError::Other(msg) => FatalError::Renderer(msg).into(),
    }
}
