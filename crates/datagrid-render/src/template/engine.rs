//! Template engine abstraction.
//!
//! [`TemplateEngine`] is the foreign rendering object the composition
//! renderer drives. The default implementation is [`MiniJinjaEngine`].

use minijinja::{Environment, Value};

use crate::error::RenderError;

/// A template engine that renders structured data.
pub trait TemplateEngine: Send + Sync {
    /// Compiles and renders a template string in one step.
    fn render_template(&self, template: &str, data: &serde_json::Value) -> Result<String, RenderError>;

    /// Adds a named template, compiling it now.
    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError>;

    /// Renders a previously added template.
    fn render_named(&self, name: &str, data: &serde_json::Value) -> Result<String, RenderError>;

    fn has_template(&self, name: &str) -> bool;
}

/// MiniJinja-based template engine.
///
/// ```rust
/// use datagrid_render::{MiniJinjaEngine, TemplateEngine};
/// use serde_json::json;
///
/// let engine = MiniJinjaEngine::new();
/// let output = engine
///     .render_template("{{ dir | direction_name }}", &json!({"dir": "DESC"}))
///     .unwrap();
/// assert_eq!(output, "descending");
/// ```
pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl std::fmt::Debug for MiniJinjaEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiniJinjaEngine").finish_non_exhaustive()
    }
}

impl MiniJinjaEngine {
    /// Creates an engine with the datagrid filters registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        register_filters(&mut env);
        Self { env }
    }

    /// The underlying environment, for registering more filters or functions.
    pub fn environment_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render_template(&self, template: &str, data: &serde_json::Value) -> Result<String, RenderError> {
        let value = Value::from_serialize(data);
        Ok(self.env.render_str(template, value)?)
    }

    fn add_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    fn render_named(&self, name: &str, data: &serde_json::Value) -> Result<String, RenderError> {
        let tmpl = self.env.get_template(name)?;
        let value = Value::from_serialize(data);
        Ok(tmpl.render(value)?)
    }

    fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }
}

/// Registers the datagrid filters with a MiniJinja environment.
///
/// - `direction_name`: `ASC`/`DESC` to `ascending`/`descending`, anything
///   else to `natural`
pub fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("direction_name", |value: Value| -> String {
        match value.as_str().map(str::to_ascii_uppercase).as_deref() {
            Some("ASC") => "ascending".to_string(),
            Some("DESC") => "descending".to_string(),
            _ => "natural".to_string(),
        }
    });
}
