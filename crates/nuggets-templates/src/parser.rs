use std::collections::BTreeMap;

use serde::Serialize;
use serde::Serializer;

use crate::error::TemplateSyntaxError;
use crate::tokens::split_contents;

/// The two nugget tags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TagKind {
    /// `get_nugget`: look the record up and bind it into the context.
    #[serde(rename = "get_nugget")]
    Get,
    /// `render_nugget`: additionally render the record through a template.
    #[serde(rename = "render_nugget")]
    Render,
}

impl TagKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get_nugget",
            Self::Render => "render_nugget",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "get_nugget" => Some(Self::Get),
            "render_nugget" => Some(Self::Render),
            _ => None,
        }
    }

    /// Whether this tag accepts `keyword` in its `with` clause.
    fn accepts(self, keyword: ArgKeyword) -> bool {
        match self {
            Self::Get => keyword == ArgKeyword::CacheTime,
            Self::Render => true,
        }
    }
}

/// Keywords recognized in a `with` clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgKeyword {
    CacheTime,
    TemplatePath,
    TemplateContextVariable,
}

impl ArgKeyword {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CacheTime => "cache_time",
            Self::TemplatePath => "template_path",
            Self::TemplateContextVariable => "template_context_variable",
        }
    }

    fn from_name(keyword: &str) -> Option<Self> {
        match keyword {
            "cache_time" => Some(Self::CacheTime),
            "template_path" => Some(Self::TemplatePath),
            "template_context_variable" => Some(Self::TemplateContextVariable),
            _ => None,
        }
    }
}

// Serialized as a plain string so the type can key a JSON map.
impl Serialize for ArgKeyword {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// The parse-time product of a nugget tag: which tag, plus the raw
/// expressions it will resolve at render time.
///
/// Expressions keep their source form here (quotes included); resolution
/// against a context happens per render, so one invocation can be rendered
/// many times.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagInvocation {
    tag: TagKind,
    key: String,
    model: String,
    output_variable: Option<String>,
    arguments: BTreeMap<ArgKeyword, String>,
}

impl TagInvocation {
    /// Parse one tag's source text, e.g.
    /// `get_nugget "welcome" for "site.snippet" with cache_time="60" as "var"`.
    ///
    /// The grammar is
    /// `<tag> <key> for <model> [with k=v [and k=v ...]] [as <var>]`; any
    /// leftover token is an error.
    pub fn parse(source: &str) -> Result<Self, TemplateSyntaxError> {
        let tokens = split_contents(source);
        let Some((name, rest)) = tokens.split_first() else {
            return Err(TemplateSyntaxError::EmptyTag);
        };
        let Some(tag) = TagKind::from_name(name) else {
            return Err(TemplateSyntaxError::UnknownTag { name: name.clone() });
        };
        ArgumentParser::new(tag, rest).parse()
    }

    #[must_use]
    pub fn tag(&self) -> TagKind {
        self.tag
    }

    /// The key expression, unresolved.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The model-reference expression, unresolved.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The `as` clause expression, if any.
    #[must_use]
    pub fn output_variable(&self) -> Option<&str> {
        self.output_variable.as_deref()
    }

    /// The value expression given for `keyword`, if any.
    #[must_use]
    pub fn argument(&self, keyword: ArgKeyword) -> Option<&str> {
        self.arguments.get(&keyword).map(String::as_str)
    }
}

/// Recursive-descent parser over the split tag tokens (tag name already
/// consumed).
struct ArgumentParser<'a> {
    tag: TagKind,
    tokens: &'a [String],
    current: usize,
}

impl<'a> ArgumentParser<'a> {
    fn new(tag: TagKind, tokens: &'a [String]) -> Self {
        Self {
            tag,
            tokens,
            current: 0,
        }
    }

    fn parse(mut self) -> Result<TagInvocation, TemplateSyntaxError> {
        let (key, model) = self.parse_head()?;

        let mut arguments = BTreeMap::new();
        if self.peek() == Some("with") {
            self.consume();
            self.parse_pairs(&mut arguments)?;
        }

        let output_variable = self.parse_as_clause()?;

        if self.peek().is_some() {
            return Err(TemplateSyntaxError::ExpectedWith {
                tag: self.tag_name(),
            });
        }

        Ok(TagInvocation {
            tag: self.tag,
            key,
            model,
            output_variable,
            arguments,
        })
    }

    /// `<key> for <model>`
    fn parse_head(&mut self) -> Result<(String, String), TemplateSyntaxError> {
        let Some(key) = self.consume() else {
            return Err(self.missing_arguments());
        };
        if self.consume() != Some("for") {
            return Err(self.missing_arguments());
        }
        let Some(model) = self.consume() else {
            return Err(self.missing_arguments());
        };
        Ok((key.to_string(), model.to_string()))
    }

    fn missing_arguments(&self) -> TemplateSyntaxError {
        TemplateSyntaxError::MissingArguments {
            tag: self.tag_name(),
        }
    }

    /// `k=v (and k=v)*`, the leading `with` already consumed.
    fn parse_pairs(
        &mut self,
        arguments: &mut BTreeMap<ArgKeyword, String>,
    ) -> Result<(), TemplateSyntaxError> {
        loop {
            let pair = self
                .consume()
                .ok_or_else(|| TemplateSyntaxError::ExpectedPair {
                    tag: self.tag_name(),
                })?;
            let (name, value) =
                pair.split_once('=')
                    .ok_or_else(|| TemplateSyntaxError::MalformedParameter {
                        tag: self.tag_name(),
                        token: pair.to_string(),
                    })?;
            let keyword = ArgKeyword::from_name(name)
                .filter(|keyword| self.tag.accepts(*keyword))
                .ok_or_else(|| TemplateSyntaxError::UnknownKeyword {
                    tag: self.tag_name(),
                    keyword: name.to_string(),
                })?;
            arguments.insert(keyword, value.to_string());

            match self.peek() {
                Some("and") => {
                    self.consume();
                }
                Some("as") | None => return Ok(()),
                Some(_) => {
                    return Err(TemplateSyntaxError::ExpectedAnd {
                        tag: self.tag_name(),
                    })
                }
            }
        }
    }

    /// `as <expr>`, if present.
    fn parse_as_clause(&mut self) -> Result<Option<String>, TemplateSyntaxError> {
        if self.peek() != Some("as") {
            return Ok(None);
        }
        self.consume();
        let variable = self
            .consume()
            .ok_or_else(|| TemplateSyntaxError::ExpectedVariable {
                tag: self.tag_name(),
            })?;
        Ok(Some(variable.to_string()))
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.current).map(String::as_str)
    }

    fn consume(&mut self) -> Option<&'a str> {
        let token = self.peek();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn tag_name(&self) -> String {
        self.tag.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<TagInvocation, TemplateSyntaxError> {
        TagInvocation::parse(source)
    }

    mod head {
        use super::*;

        #[test]
        fn test_minimal_get() {
            let invocation = parse(r#"get_nugget "welcome" for "site.snippet""#).unwrap();
            insta::assert_json_snapshot!(invocation, @r###"
            {
              "tag": "get_nugget",
              "key": "\"welcome\"",
              "model": "\"site.snippet\"",
              "output_variable": null,
              "arguments": {}
            }
            "###);
        }

        #[test]
        fn test_unquoted_expressions_kept_raw() {
            let invocation = parse("get_nugget key_var for model_var").unwrap();
            assert_eq!(invocation.key(), "key_var");
            assert_eq!(invocation.model(), "model_var");
        }

        #[test]
        fn test_missing_for_keyword() {
            assert_eq!(
                parse(r#"get_nugget "welcome" of "site.snippet""#),
                Err(TemplateSyntaxError::MissingArguments {
                    tag: "get_nugget".to_string()
                })
            );
        }

        #[test]
        fn test_too_few_tokens() {
            for source in ["get_nugget", "get_nugget k", "get_nugget k for"] {
                assert_eq!(
                    parse(source),
                    Err(TemplateSyntaxError::MissingArguments {
                        tag: "get_nugget".to_string()
                    }),
                    "{source}"
                );
            }
        }

        #[test]
        fn test_empty_source() {
            assert_eq!(parse("   "), Err(TemplateSyntaxError::EmptyTag));
        }

        #[test]
        fn test_unknown_tag() {
            assert_eq!(
                parse("fetch_nugget k for m"),
                Err(TemplateSyntaxError::UnknownTag {
                    name: "fetch_nugget".to_string()
                })
            );
        }

        #[test]
        fn test_dangling_token_after_head() {
            assert_eq!(
                parse("get_nugget k for m garbage"),
                Err(TemplateSyntaxError::ExpectedWith {
                    tag: "get_nugget".to_string()
                })
            );
        }
    }

    mod with_clause {
        use super::*;

        #[test]
        fn test_single_pair() {
            let invocation = parse(r#"get_nugget k for m with cache_time="60""#).unwrap();
            assert_eq!(invocation.argument(ArgKeyword::CacheTime), Some(r#""60""#));
            assert_eq!(invocation.argument(ArgKeyword::TemplatePath), None);
        }

        #[test]
        fn test_pairs_joined_with_and() {
            let invocation = parse(
                r#"render_nugget k for m with cache_time="60" and template_path="site/banner.html" and template_context_variable="snippet""#,
            )
            .unwrap();
            insta::assert_json_snapshot!(invocation, @r###"
            {
              "tag": "render_nugget",
              "key": "k",
              "model": "m",
              "output_variable": null,
              "arguments": {
                "cache_time": "\"60\"",
                "template_path": "\"site/banner.html\"",
                "template_context_variable": "\"snippet\""
              }
            }
            "###);
        }

        #[test]
        fn test_keyword_serializes_as_plain_string() {
            let value = serde_json::to_value(ArgKeyword::TemplateContextVariable).unwrap();
            assert_eq!(value, serde_json::json!("template_context_variable"));
        }

        #[test]
        fn test_missing_and_separator() {
            assert_eq!(
                parse(r#"render_nugget k for m with cache_time="60" template_path="p""#),
                Err(TemplateSyntaxError::ExpectedAnd {
                    tag: "render_nugget".to_string()
                })
            );
        }

        #[test]
        fn test_unknown_keyword() {
            assert_eq!(
                parse("get_nugget k for m with bogus=1"),
                Err(TemplateSyntaxError::UnknownKeyword {
                    tag: "get_nugget".to_string(),
                    keyword: "bogus".to_string()
                })
            );
        }

        #[test]
        fn test_render_only_keyword_rejected_on_get() {
            assert_eq!(
                parse(r#"get_nugget k for m with template_path="p""#),
                Err(TemplateSyntaxError::UnknownKeyword {
                    tag: "get_nugget".to_string(),
                    keyword: "template_path".to_string()
                })
            );
        }

        #[test]
        fn test_bare_with() {
            assert_eq!(
                parse("get_nugget k for m with"),
                Err(TemplateSyntaxError::ExpectedPair {
                    tag: "get_nugget".to_string()
                })
            );
        }

        #[test]
        fn test_dangling_and() {
            assert_eq!(
                parse(r#"get_nugget k for m with cache_time="60" and"#),
                Err(TemplateSyntaxError::ExpectedPair {
                    tag: "get_nugget".to_string()
                })
            );
        }

        #[test]
        fn test_pair_without_equals() {
            assert_eq!(
                parse("get_nugget k for m with cache_time"),
                Err(TemplateSyntaxError::MalformedParameter {
                    tag: "get_nugget".to_string(),
                    token: "cache_time".to_string()
                })
            );
        }

        #[test]
        fn test_duplicate_keyword_last_wins() {
            let invocation =
                parse(r#"get_nugget k for m with cache_time="1" and cache_time="2""#).unwrap();
            assert_eq!(invocation.argument(ArgKeyword::CacheTime), Some(r#""2""#));
        }

        #[test]
        fn test_quoted_value_keeps_spaces() {
            let invocation =
                parse(r#"render_nugget k for m with template_path="a dir/b.html""#).unwrap();
            assert_eq!(
                invocation.argument(ArgKeyword::TemplatePath),
                Some(r#""a dir/b.html""#)
            );
        }
    }

    mod as_clause {
        use super::*;

        #[test]
        fn test_captures_output_variable() {
            let invocation = parse(r#"get_nugget k for m as "banner""#).unwrap();
            assert_eq!(invocation.output_variable(), Some(r#""banner""#));
        }

        #[test]
        fn test_follows_with_clause() {
            let invocation =
                parse(r#"get_nugget k for m with cache_time="60" as "banner""#).unwrap();
            assert_eq!(invocation.argument(ArgKeyword::CacheTime), Some(r#""60""#));
            assert_eq!(invocation.output_variable(), Some(r#""banner""#));
        }

        #[test]
        fn test_as_without_variable() {
            assert_eq!(
                parse("get_nugget k for m as"),
                Err(TemplateSyntaxError::ExpectedVariable {
                    tag: "get_nugget".to_string()
                })
            );
        }

        #[test]
        fn test_trailing_tokens_after_as() {
            assert_eq!(
                parse("get_nugget k for m as v extra"),
                Err(TemplateSyntaxError::ExpectedWith {
                    tag: "get_nugget".to_string()
                })
            );
        }
    }
}
