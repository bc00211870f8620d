use nuggets::KeyError;
use thiserror::Error;

/// Every way a nugget tag can fail, at parse time or render time.
///
/// The first failure aborts the tag; there is no partial output.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TemplateSyntaxError {
    #[error("{tag} requires at least one argument defining which app and model to use as nugget")]
    MissingArguments { tag: String },

    #[error("{tag} tag requires parameters specified using the \"with\" keyword")]
    ExpectedWith { tag: String },

    #[error("{tag} tag parameters have to be concatenated with \"and\" keyword")]
    ExpectedAnd { tag: String },

    #[error("{tag} tag expects a key=value pair after \"with\" and \"and\"")]
    ExpectedPair { tag: String },

    #[error("{tag} tag expects a variable name after \"as\"")]
    ExpectedVariable { tag: String },

    #[error("{tag} tag parameter {token} is not of the form key=value")]
    MalformedParameter { tag: String, token: String },

    #[error("{tag} tag does not accept the {keyword} keyword")]
    UnknownKeyword { tag: String, keyword: String },

    #[error("Empty tag")]
    EmptyTag,

    #[error("Unknown tag {name}")]
    UnknownTag { name: String },

    #[error("Variable {name} does not exist")]
    VariableDoesNotExist { name: String },

    #[error("cache_time value {value} is not a non-negative integer")]
    InvalidCacheTime { value: String },

    #[error("Model {reference} must be registered as a nugget model")]
    UnknownModel { reference: String },

    #[error("Could not resolve instance for model {model} with key {key}")]
    NuggetNotFound { model: String, key: String },

    #[error("Could not find template in {candidates:?}")]
    TemplateNotFound { candidates: Vec<String> },

    #[error("invalid nugget key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error("nugget source failed for model {model}: {message}")]
    SourceFailed { model: String, message: String },
}
