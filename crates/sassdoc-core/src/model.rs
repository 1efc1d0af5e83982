//! Data model for parsed documentation — theme-agnostic and JSON-serialisable.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of declaration a doc comment is attached to.
///
/// Declaration order is the secondary sort key used by [`crate::sort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    Function,
    Mixin,
    Placeholder,
    Variable,
    Unknown,
}

impl ContextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContextKind::Function => "function",
            ContextKind::Mixin => "mixin",
            ContextKind::Placeholder => "placeholder",
            ContextKind::Variable => "variable",
            ContextKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive 1-based line span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// One entry of a function or mixin parameter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    /// Name without the `$` sigil.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// `$args...`
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub rest: bool,
}

/// Variable scope as declared by flags or naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Public,
    Private,
    Default,
    Global,
}

/// The declaration following a doc comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Context {
    #[serde(rename = "type")]
    pub kind: ContextKind,
    pub name: String,
    pub line: LineRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Variable value, flags stripped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Body between the outermost braces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Context {
    /// Context used when no declaration follows the comment.
    pub fn unknown(line: usize) -> Self {
        Context {
            kind: ContextKind::Unknown,
            name: String::new(),
            line: LineRange {
                start: line,
                end: line,
            },
            parameters: Vec::new(),
            value: None,
            scope: None,
            code: None,
        }
    }
}

/// Raw comment lines as produced by the lexer, markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    pub lines: Vec<String>,
    pub is_poster: bool,
    pub path: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Annotation values after validation.
///
/// Single-valued annotations collapse to their one value; multi-valued ones
/// keep every occurrence in encounter order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    Single(Value),
    Multiple(Vec<Value>),
}

impl AnnotationValue {
    /// First (or only) value.
    pub fn first(&self) -> Option<&Value> {
        match self {
            AnnotationValue::Single(v) => Some(v),
            AnnotationValue::Multiple(vs) => vs.first(),
        }
    }

    pub fn values(&self) -> &[Value] {
        match self {
            AnnotationValue::Single(v) => std::slice::from_ref(v),
            AnnotationValue::Multiple(vs) => vs,
        }
    }
}

/// Source file the record came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub name: String,
}

impl FileInfo {
    pub fn new(path: &str) -> Self {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path).to_string();
        FileInfo {
            path: path.to_string(),
            name,
        }
    }
}

/// One documented item: a comment block plus the declaration it precedes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentationRecord {
    pub description: String,
    pub context: Context,
    pub annotations: BTreeMap<String, AnnotationValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub file: FileInfo,
    /// Lines covered by the comment block.
    pub line: LineRange,
    /// Fields added by resolve steps.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentationRecord {
    pub fn annotation(&self, name: &str) -> Option<&AnnotationValue> {
        self.annotations.get(name)
    }

    /// Declared group, if any.
    pub fn group(&self) -> Option<&str> {
        self.annotations
            .get("group")
            .and_then(AnnotationValue::first)
            .and_then(Value::as_str)
    }
}

/// File-level comment not attached to a declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosterComment {
    pub description: String,
    /// Validated values, keyed by canonical annotation name.
    pub annotations: BTreeMap<String, Vec<Value>>,
    pub line: LineRange,
}

/// Non-fatal issue found while parsing a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
    pub path: String,
    pub line: usize,
}

impl Warning {
    pub fn new(message: impl Into<String>, path: &str, line: usize) -> Self {
        Warning {
            message: message.into(),
            path: path.to_string(),
            line,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (in {}:{})", self.message, self.path, self.line)
    }
}

/// A file handed to the parser by the input side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: String,
    pub content: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        SourceUnit {
            path: path.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_name_from_path() {
        assert_eq!(FileInfo::new("scss/utils/_math.scss").name, "_math.scss");
        assert_eq!(FileInfo::new("main.scss").name, "main.scss");
    }

    #[test]
    fn record_serialises_flat_extra_fields() {
        let mut extra = Map::new();
        extra.insert("foo".into(), json!("bar"));
        let record = DocumentationRecord {
            description: "desc".into(),
            context: Context::unknown(3),
            annotations: BTreeMap::from([(
                "author".to_string(),
                AnnotationValue::Multiple(vec![json!("me")]),
            )]),
            warnings: Vec::new(),
            file: FileInfo::new("a.scss"),
            line: LineRange { start: 1, end: 2 },
            extra,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["foo"], json!("bar"));
        assert_eq!(value["context"]["type"], json!("unknown"));
        assert_eq!(value["annotations"]["author"], json!(["me"]));
        assert!(value.get("warnings").is_none());
    }

    #[test]
    fn single_value_serialises_bare() {
        let v = AnnotationValue::Single(json!({"type": "String"}));
        assert_eq!(serde_json::to_value(&v).unwrap(), json!({"type": "String"}));
        assert_eq!(v.values().len(), 1);
    }
}
