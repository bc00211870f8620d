use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::TemplateSyntaxError;
use crate::tokens::unquote;

/// The variables a tag renders against.
///
/// Values are JSON so records, strings, and numbers all bind the same way.
/// Lookups accept dotted paths: `nugget.title` traverses into objects, and a
/// numeric segment indexes into arrays.
#[derive(Clone, Debug, Default)]
pub struct Context {
    vars: FxHashMap<String, Value>,
}

impl Context {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous binding.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Resolve a dotted path against the bound variables.
    #[must_use]
    pub fn resolve_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut value = self.vars.get(segments.next()?)?;
        for segment in segments {
            value = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }
}

/// Resolve a tag expression against the context.
///
/// An all-digit token is an integer literal, a quoted token is a string
/// literal with the quotes stripped, and anything else is a (dotted) variable
/// lookup that fails if the variable is absent.
pub(crate) fn resolve_expression(
    expr: &str,
    context: &Context,
) -> Result<Value, TemplateSyntaxError> {
    if !expr.is_empty() && expr.chars().all(|ch| ch.is_ascii_digit()) {
        if let Ok(number) = expr.parse::<u64>() {
            return Ok(Value::from(number));
        }
    }
    if let Some(inner) = unquote(expr) {
        return Ok(Value::String(inner.to_string()));
    }
    context
        .resolve_path(expr)
        .cloned()
        .ok_or_else(|| TemplateSyntaxError::VariableDoesNotExist {
            name: expr.to_string(),
        })
}

/// A resolved value as plain text: strings verbatim, everything else in its
/// JSON form.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
