use std::time::Duration;

use nuggets::cache_key;
use nuggets::fetch_or_cache;
use nuggets::ModelRef;
use nuggets::NuggetKey;
use nuggets::NuggetRecord;
use nuggets::StoreError;
use serde_json::Value;
use tracing::debug;

use crate::context::resolve_expression;
use crate::context::value_text;
use crate::context::Context;
use crate::engine::NuggetEngine;
use crate::error::TemplateSyntaxError;
use crate::parser::ArgKeyword;
use crate::parser::TagInvocation;
use crate::parser::TagKind;

/// A parsed nugget tag, ready to render against a context.
///
/// Rendering is terminal on the first error and produces either the tag's
/// direct output (`render_nugget` without an `as` clause) or the empty
/// string after binding the result into the context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NuggetNode {
    invocation: TagInvocation,
}

impl NuggetNode {
    #[must_use]
    pub fn new(invocation: TagInvocation) -> Self {
        Self { invocation }
    }

    #[must_use]
    pub fn invocation(&self) -> &TagInvocation {
        &self.invocation
    }

    /// Run the tag: resolve expressions, look the record up through the
    /// cache, optionally render it through a template, and place the result.
    pub fn render(
        &self,
        engine: &NuggetEngine,
        context: &mut Context,
    ) -> Result<String, TemplateSyntaxError> {
        // The key resolves first and is normalized once; the cache key, the
        // source lookup, the candidate template names, and the default
        // output variable all use the normalized form.
        let key_value = resolve_expression(self.invocation.key(), context)?;
        let key = NuggetKey::new(&value_text(&key_value))?;

        let timeout = match self.invocation.argument(ArgKeyword::CacheTime) {
            Some(expr) => cache_time_seconds(&resolve_expression(expr, context)?)?,
            None => 0,
        };

        let model_text = value_text(&resolve_expression(self.invocation.model(), context)?);
        let model_ref = ModelRef::parse(&model_text).ok_or_else(|| {
            TemplateSyntaxError::UnknownModel {
                reference: model_text.clone(),
            }
        })?;
        let source = engine.models().source(&model_ref).ok_or_else(|| {
            TemplateSyntaxError::UnknownModel {
                reference: model_text.clone(),
            }
        })?;

        let lookup_key = cache_key(engine.settings().cache_prefix(), key.as_str());
        debug!(
            tag = self.invocation.tag().name(),
            key = key.as_str(),
            model = %model_ref,
            "rendering nugget tag"
        );

        let record = fetch_or_cache(
            engine.cache(),
            &lookup_key,
            Duration::from_secs(timeout),
            || source.get(key.as_str()),
        )
        .map_err(|error| match error {
            StoreError::NotFound { .. } => TemplateSyntaxError::NuggetNotFound {
                model: model_ref.to_string(),
                key: key.as_str().to_string(),
            },
            StoreError::Backend(message) => TemplateSyntaxError::SourceFailed {
                model: model_ref.to_string(),
                message,
            },
        })?;

        match self.invocation.tag() {
            TagKind::Render => {
                let markup = self.render_template(engine, context, &model_ref, &key, &record)?;
                let Some(expr) = self.invocation.output_variable() else {
                    // No output variable: the markup is the tag output.
                    return Ok(markup);
                };
                let name = value_text(&resolve_expression(expr, context)?);
                context.insert(name, markup);
                Ok(String::new())
            }
            TagKind::Get => {
                let name = match self.invocation.output_variable() {
                    Some(expr) => value_text(&resolve_expression(expr, context)?),
                    None => format!("nugget_{key}"),
                };
                context.insert(name, record.to_value());
                Ok(String::new())
            }
        }
    }

    /// Select the template for the record and render it with the record
    /// bound into the context.
    ///
    /// Candidates, in order: the `template_path` argument if given, then
    /// `{app}/{model}_{key}.html`, then `{app}/{model}_nugget.html`. The
    /// record is bound under the `template_context_variable` name (default
    /// `nugget`) in the surrounding context, so the template also sees every
    /// variable the tag itself could.
    fn render_template(
        &self,
        engine: &NuggetEngine,
        context: &mut Context,
        model_ref: &ModelRef,
        key: &NuggetKey,
        record: &NuggetRecord,
    ) -> Result<String, TemplateSyntaxError> {
        let mut candidates = Vec::with_capacity(3);
        if let Some(expr) = self.invocation.argument(ArgKeyword::TemplatePath) {
            candidates.push(value_text(&resolve_expression(expr, context)?));
        }
        candidates.push(format!(
            "{}/{}_{key}.html",
            model_ref.app(),
            model_ref.model()
        ));
        candidates.push(format!(
            "{}/{}_nugget.html",
            model_ref.app(),
            model_ref.model()
        ));

        let template = engine
            .templates()
            .select_template(&candidates)
            .ok_or_else(|| TemplateSyntaxError::TemplateNotFound { candidates })?;

        let name = match self.invocation.argument(ArgKeyword::TemplateContextVariable) {
            Some(expr) => value_text(&resolve_expression(expr, context)?),
            None => "nugget".to_string(),
        };
        context.insert(name, record.to_value());

        engine.templates().render(&template, context)
    }
}

fn cache_time_seconds(value: &Value) -> Result<u64, TemplateSyntaxError> {
    let seconds = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    seconds.ok_or_else(|| TemplateSyntaxError::InvalidCacheTime {
        value: value_text(value),
    })
}
