use nuggets::CacheStore;
use nuggets::MemoryCache;
use nuggets::ModelRegistry;
use nuggets_conf::Settings;

use crate::context::Context;
use crate::error::TemplateSyntaxError;
use crate::loader::TemplateEngine;
use crate::loader::TemplateLoader;
use crate::node::NuggetNode;
use crate::parser::TagInvocation;

/// The environment a nugget tag runs in: settings plus the three
/// collaborator seams, bundled explicitly instead of read from ambient
/// state.
///
/// Construction wires up the in-process collaborators; `with_cache` and
/// `with_templates` swap in other implementations. Sources are registered
/// through [`NuggetEngine::models_mut`].
pub struct NuggetEngine {
    settings: Settings,
    cache: Box<dyn CacheStore>,
    models: ModelRegistry,
    templates: Box<dyn TemplateEngine>,
}

impl NuggetEngine {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        let templates = TemplateLoader::from_settings(&settings);
        Self {
            settings,
            cache: Box::new(MemoryCache::new()),
            models: ModelRegistry::new(),
            templates: Box::new(templates),
        }
    }

    /// Swap the cache store.
    #[must_use]
    pub fn with_cache(mut self, cache: impl CacheStore + 'static) -> Self {
        self.cache = Box::new(cache);
        self
    }

    /// Swap the template engine.
    #[must_use]
    pub fn with_templates(mut self, templates: impl TemplateEngine + 'static) -> Self {
        self.templates = Box::new(templates);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn cache(&self) -> &dyn CacheStore {
        self.cache.as_ref()
    }

    #[must_use]
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// The registry, mutably, for registering nugget sources.
    pub fn models_mut(&mut self) -> &mut ModelRegistry {
        &mut self.models
    }

    #[must_use]
    pub fn templates(&self) -> &dyn TemplateEngine {
        self.templates.as_ref()
    }

    /// Parse one tag's source text into a renderable node.
    pub fn parse(&self, source: &str) -> Result<NuggetNode, TemplateSyntaxError> {
        Ok(NuggetNode::new(TagInvocation::parse(source)?))
    }

    /// Parse and render in one step.
    pub fn render_tag(
        &self,
        source: &str,
        context: &mut Context,
    ) -> Result<String, TemplateSyntaxError> {
        self.parse(source)?.render(self, context)
    }
}
