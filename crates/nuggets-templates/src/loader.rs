use camino::Utf8PathBuf;
use nuggets_conf::Settings;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::context::value_text;
use crate::context::Context;
use crate::error::TemplateSyntaxError;

/// The template seam the render tag goes through.
///
/// `select_template` picks the first of `candidates` the engine can resolve;
/// `render` expands that template against a context. The shipped
/// [`TemplateLoader`] substitutes `{{ variable }}` markers only; richer
/// template languages plug in behind this trait.
pub trait TemplateEngine: Send + Sync {
    fn select_template(&self, candidates: &[String]) -> Option<String>;
    fn render(&self, name: &str, context: &Context) -> Result<String, TemplateSyntaxError>;
}

/// Template source lookup over explicit registrations and configured
/// directories.
///
/// Registered sources win over directory files; directories are probed in
/// configuration order. Rendering substitutes each `{{ path }}` marker with
/// the context value at `path` (dotted paths traverse nested values), or the
/// empty string when the path resolves to nothing. Everything outside the
/// markers passes through verbatim.
#[derive(Debug, Default)]
pub struct TemplateLoader {
    registered: FxHashMap<String, String>,
    dirs: Vec<Utf8PathBuf>,
}

impl TemplateLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader probing the directories configured in `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            registered: FxHashMap::default(),
            dirs: settings.template_dirs().to_vec(),
        }
    }

    /// Register an in-memory template source under `name`, replacing any
    /// previous registration.
    pub fn register(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.registered.insert(name.into(), source.into());
    }

    /// Append a directory to probe after the registered sources.
    pub fn add_dir(&mut self, dir: impl Into<Utf8PathBuf>) {
        self.dirs.push(dir.into());
    }

    fn source(&self, name: &str) -> Option<String> {
        if let Some(source) = self.registered.get(name) {
            return Some(source.clone());
        }
        self.dirs
            .iter()
            .find_map(|dir| std::fs::read_to_string(dir.join(name)).ok())
    }

    fn contains(&self, name: &str) -> bool {
        self.registered.contains_key(name)
            || self.dirs.iter().any(|dir| dir.join(name).is_file())
    }
}

impl TemplateEngine for TemplateLoader {
    fn select_template(&self, candidates: &[String]) -> Option<String> {
        let selected = candidates.iter().find(|name| self.contains(name));
        if let Some(name) = selected {
            debug!(template = name.as_str(), "selected template");
        }
        selected.cloned()
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, TemplateSyntaxError> {
        let source = self
            .source(name)
            .ok_or_else(|| TemplateSyntaxError::TemplateNotFound {
                candidates: vec![name.to_string()],
            })?;
        Ok(substitute(&source, context))
    }
}

/// Replace every `{{ path }}` in `source` with the context value at `path`;
/// unresolvable paths render as the empty string. An unterminated marker is
/// emitted verbatim.
fn substitute(source: &str, context: &Context) -> String {
    let mut output = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            output.push_str(&rest[start..]);
            return output;
        };
        let path = after[..end].trim();
        if let Some(value) = context.resolve_path(path) {
            output.push_str(&value_text(value));
        }
        rest = &after[end + 2..];
    }
    output.push_str(rest);
    output
}
