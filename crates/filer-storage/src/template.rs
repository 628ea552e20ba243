//! Shard templates.
//!
//! A template is a format string over the placeholders `{id}`, `{id02}`,
//! `{id24}` and `{filename}`. `{{` and `}}` render literal braces. Templates
//! are parsed once at construction; rendering cannot fail.

use crate::error::{StorageError, StorageResult};
use crate::key::FileKey;
use filer_core::constants::DEFAULT_SHARD_TEMPLATE;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Id02,
    Id24,
    Filename,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Field::Id),
            "id02" => Some(Field::Id02),
            "id24" => Some(Field::Id24),
            "filename" => Some(Field::Filename),
            _ => None,
        }
    }

    fn value<'a>(&self, key: &'a FileKey) -> &'a str {
        match self {
            Field::Id => key.id(),
            Field::Id02 => key.id02(),
            Field::Id24 => key.id24(),
            Field::Filename => key.filename(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShardTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl ShardTemplate {
    pub fn parse(source: &str) -> StorageResult<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(StorageError::InvalidTemplate(format!(
                                    "unclosed placeholder in {:?}",
                                    source
                                )))
                            }
                        }
                    }
                    let field = Field::from_name(&name).ok_or_else(|| {
                        StorageError::InvalidTemplate(format!(
                            "unknown placeholder {{{}}} in {:?}",
                            name, source
                        ))
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(StorageError::InvalidTemplate(format!(
                        "unmatched '}}' in {:?}",
                        source
                    )))
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let references_id = segments.iter().any(|s| {
            matches!(
                s,
                Segment::Field(Field::Id) | Segment::Field(Field::Id02) | Segment::Field(Field::Id24)
            )
        });
        if !references_id {
            return Err(StorageError::InvalidTemplate(format!(
                "{:?} does not reference the file id",
                source
            )));
        }

        Ok(ShardTemplate {
            source: source.to_string(),
            segments,
        })
    }

    /// Substitute the key's parts into the template, giving the path relative
    /// to the storage root (or base URL).
    pub fn render(&self, key: &FileKey) -> String {
        let mut out = String::with_capacity(self.source.len() + key.id().len() * 2);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => out.push_str(field.value(key)),
            }
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for ShardTemplate {
    fn default() -> Self {
        ShardTemplate {
            source: DEFAULT_SHARD_TEMPLATE.to_string(),
            segments: vec![
                Segment::Field(Field::Id02),
                Segment::Literal("/".to_string()),
                Segment::Field(Field::Id24),
                Segment::Literal("/".to_string()),
                Segment::Field(Field::Id),
                Segment::Literal("/".to_string()),
                Segment::Field(Field::Filename),
            ],
        }
    }
}

impl FromStr for ShardTemplate {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShardTemplate::parse(s)
    }
}

impl TryFrom<String> for ShardTemplate {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ShardTemplate::parse(&value)
    }
}

impl From<ShardTemplate> for String {
    fn from(template: ShardTemplate) -> Self {
        template.source
    }
}

impl fmt::Display for ShardTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(template: &str, key: &str) -> String {
        ShardTemplate::parse(template)
            .unwrap()
            .render(&FileKey::parse(key).unwrap())
    }

    #[test]
    fn default_matches_parsed_default() {
        assert_eq!(
            ShardTemplate::default(),
            ShardTemplate::parse(DEFAULT_SHARD_TEMPLATE).unwrap()
        );
    }

    #[test]
    fn renders_default_layout() {
        let key = FileKey::parse("abcd1234/photo.jpg").unwrap();
        assert_eq!(
            ShardTemplate::default().render(&key),
            "ab/cd/abcd1234/photo.jpg"
        );
    }

    #[test]
    fn short_id_renders_empty_shard() {
        assert_eq!(
            render(DEFAULT_SHARD_TEMPLATE, "a/photo.jpg"),
            "a//a/photo.jpg"
        );
    }

    #[test]
    fn custom_templates() {
        assert_eq!(render("{id}/{filename}", "abcd/x.png"), "abcd/x.png");
        assert_eq!(render("files/{id02}/{id}-{filename}", "abcd/x.png"), "files/ab/abcd-x.png");
        assert_eq!(render("{{{id}}}", "abcd/x"), "{abcd}");
    }

    #[test]
    fn rejects_unknown_placeholder() {
        assert!(matches!(
            ShardTemplate::parse("{id}/{name}"),
            Err(StorageError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        assert!(ShardTemplate::parse("{id/{filename}").is_err());
        assert!(ShardTemplate::parse("{id}}/x").is_err());
    }

    #[test]
    fn rejects_template_without_id() {
        assert!(ShardTemplate::parse("{filename}").is_err());
        assert!(ShardTemplate::parse("static/path").is_err());
    }

    #[test]
    fn serde_uses_the_source_string() {
        let template: ShardTemplate = serde_json::from_str("\"{id02}/{id}\"").unwrap();
        assert_eq!(template.as_str(), "{id02}/{id}");
        assert_eq!(serde_json::to_string(&template).unwrap(), "\"{id02}/{id}\"");
        assert!(serde_json::from_str::<ShardTemplate>("\"{bogus}\"").is_err());
    }
}
