//! Template tags for nuggets: `get_nugget` and `render_nugget`.
//!
//! Both tags share one grammar,
//! `<tag> <key> for <app.model> [with k=v [and k=v ...]] [as <var>]`,
//! parsed once into a [`TagInvocation`] and rendered per request by a
//! [`NuggetNode`] against a [`Context`]. Rendering looks the record up
//! cache-aside through the engine's collaborators; `render_nugget`
//! additionally expands the record through a selected template.
//!
//! ```
//! use nuggets::NuggetRecord;
//! use nuggets_conf::Settings;
//! use nuggets_templates::Context;
//! use nuggets_templates::NuggetEngine;
//!
//! let mut engine = NuggetEngine::new(Settings::default());
//! engine.models_mut().register_fn("site.snippet", |key| {
//!     Ok(NuggetRecord::new(key)?.with_field("title", "Hello"))
//! });
//!
//! let mut context = Context::new();
//! engine
//!     .render_tag(
//!         r#"get_nugget "welcome" for "site.snippet" as "banner""#,
//!         &mut context,
//!     )
//!     .unwrap();
//! assert!(context.contains("banner"));
//! ```

mod context;
mod engine;
mod error;
mod loader;
mod node;
mod parser;
mod tokens;

pub use context::Context;
pub use engine::NuggetEngine;
pub use error::TemplateSyntaxError;
pub use loader::TemplateEngine;
pub use loader::TemplateLoader;
pub use node::NuggetNode;
pub use parser::ArgKeyword;
pub use parser::TagInvocation;
pub use parser::TagKind;
pub use tokens::split_contents;
