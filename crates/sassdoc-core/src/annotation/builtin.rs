//! Built-in annotations.
//!
//! Parsing is permissive: malformed text degrades to the closest sensible
//! value instead of being rejected.

use super::AnnotationDescriptor;
use crate::config::Options;
use crate::error::{Error, Result};
use crate::model::ContextKind::{self, Function, Mixin, Placeholder, Variable};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

/// `{type} $name [default] - description`
static RE_PARAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*(?:\{([^}]*)\})?\s*(?:\$?([^\s\[\]{}]+))?\s*(?:\[([^\]]*)\])?\s*(?:-\s*)?(.*)$").unwrap()
});

/// `{type} description`
static RE_TYPED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*(?:\{([^}]*)\})?\s*(?:-\s*)?(.*)$").unwrap());

/// `{kind} name - description <url>`
static RE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*(?:\{([^}]*)\})?\s*([^\s<]+)?\s*(?:-\s*)?(.*?)\s*(?:<([^>]*)>)?\s*$").unwrap()
});

/// First line of `@example`: `type - description`
static RE_EXAMPLE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([\w-]+)\s*(?:-\s*)?(.*)$").unwrap());

static RE_ERROR_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"@error\s+(?:'([^']*)'|"([^"]*)")"#).unwrap());

const CALLABLES: &[ContextKind] = &[Function, Mixin, Placeholder];

/// Every built-in descriptor.
pub fn all(options: &Options) -> Result<Vec<AnnotationDescriptor>> {
    Ok(vec![
        access(options)?,
        text("alias").single().allowed_on(&[Function, Mixin, Placeholder, Variable]),
        text("author"),
        content(),
        text("deprecated").single(),
        example(options),
        group(options),
        text("ignore"),
        link(),
        text("output").alias("outputs").single().allowed_on(&[Mixin]),
        parameter(),
        property(),
        reference("require").alias("requires").allowed_on(CALLABLES),
        returns(),
        reference("see"),
        since(),
        throw(),
        text("todo"),
        text("type").single().allowed_on(&[Variable]),
    ])
}

// -- Descriptors --------------------------------------------------------------

/// Trimmed text, multi-valued, allowed everywhere.
fn text(name: &str) -> AnnotationDescriptor {
    AnnotationDescriptor::new(name, |raw| json!(raw.trim()))
}

fn access(options: &Options) -> Result<AnnotationDescriptor> {
    let private = Regex::new(&options.private_prefix).map_err(|e| Error::InvalidOption {
        option: "privatePrefix".to_string(),
        reason: e.to_string(),
    })?;
    Ok(text("access").single().autofill(move |record| {
        let access = if private.is_match(&record.context.name) {
            "private"
        } else {
            "public"
        };
        vec![json!(access)]
    }))
}

fn content() -> AnnotationDescriptor {
    text("content")
        .single()
        .allowed_on(&[Mixin])
        .autofill(|record| match &record.context.code {
            Some(code) if code.contains("@content") => vec![json!("")],
            _ => Vec::new(),
        })
}

fn example(options: &Options) -> AnnotationDescriptor {
    let default_type = options.example_type.clone();
    AnnotationDescriptor::new("example", move |raw| parse_example(raw, &default_type))
}

fn group(options: &Options) -> AnnotationDescriptor {
    let default_group = options.default_group.clone();
    AnnotationDescriptor::new("group", |raw| json!(raw.trim().to_lowercase()))
        .single()
        .autofill(move |_| vec![json!(default_group)])
}

fn link() -> AnnotationDescriptor {
    AnnotationDescriptor::new("link", |raw| {
        let raw = raw.trim();
        let (url, caption) = match raw.split_once(char::is_whitespace) {
            Some((url, caption)) => (url, Some(caption.trim().to_string())),
            None => (raw, None),
        };
        object([("url", Some(url.to_string())), ("caption", caption)])
    })
    .alias("source")
}

fn parameter() -> AnnotationDescriptor {
    AnnotationDescriptor::new("parameter", |raw| {
        let fields = typed_name(raw);
        object([
            ("type", fields.kind),
            ("name", fields.name),
            ("default", fields.default),
            ("description", fields.description),
        ])
    })
    .alias("param")
    .alias("arg")
    .alias("argument")
    .allowed_on(&[Function, Mixin])
}

fn property() -> AnnotationDescriptor {
    AnnotationDescriptor::new("property", |raw| {
        let fields = typed_name(raw);
        object([
            ("type", fields.kind),
            ("path", fields.name),
            ("default", fields.default),
            ("description", fields.description),
        ])
    })
    .alias("prop")
    .allowed_on(&[Variable])
}

fn reference(name: &str) -> AnnotationDescriptor {
    AnnotationDescriptor::new(name, parse_reference)
}

fn returns() -> AnnotationDescriptor {
    AnnotationDescriptor::new("return", |raw| {
        let caps = RE_TYPED.captures(raw);
        let group = |i: usize| {
            caps.as_ref()
                .and_then(|c| c.get(i))
                .map(|m| m.as_str().trim().to_string())
                .filter(|s| !s.is_empty())
        };
        object([("type", group(1)), ("description", group(2))])
    })
    .alias("returns")
    .single()
    .allowed_on(&[Function])
}

fn since() -> AnnotationDescriptor {
    AnnotationDescriptor::new("since", |raw| {
        let raw = raw.trim();
        let (version, description) = match raw.split_once(char::is_whitespace) {
            Some((v, d)) => (v, Some(d.trim().to_string())),
            None => (raw, None),
        };
        object([("version", Some(version.to_string())), ("description", description)])
    })
}

fn throw() -> AnnotationDescriptor {
    text("throw")
        .alias("throws")
        .alias("exception")
        .allowed_on(CALLABLES)
        .autofill(|record| {
            let Some(code) = &record.context.code else {
                return Vec::new();
            };
            RE_ERROR_DIRECTIVE
                .captures_iter(code)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| json!(m.as_str()))
                .collect()
        })
}

// -- Parsers ------------------------------------------------------------------

/// `@example [type [- description]]` followed by code lines.
///
/// The first line names the type only when a line break follows it;
/// otherwise the whole text is code of the default type.
pub fn parse_example(raw: &str, default_type: &str) -> Value {
    let mut kind = default_type.to_string();
    let mut description = None;
    let mut code = raw;

    if let Some((first, rest)) = raw.split_once('\n') {
        if let Some(caps) = RE_EXAMPLE_HEAD.captures(first) {
            kind = caps[1].to_string();
            description = caps
                .get(2)
                .map(|m| m.as_str().trim().to_string())
                .filter(|d| !d.is_empty());
            code = rest;
        }
    }

    let code = dedent(code.trim_matches('\n'));
    let mut value = object([("type", Some(kind)), ("description", description)]);
    if let Value::Object(map) = &mut value {
        map.insert("code".to_string(), Value::String(code));
    }
    value
}

/// `@require` / `@see`: the kind defaults from the name's sigil.
fn parse_reference(raw: &str) -> Value {
    let Some(caps) = RE_REFERENCE.captures(raw) else {
        return json!({ "type": "function", "name": raw.trim() });
    };
    let name = caps.get(2).map_or("", |m| m.as_str());
    let (inferred, bare) = if let Some(n) = name.strip_prefix('$') {
        ("variable", n)
    } else if let Some(n) = name.strip_prefix('%') {
        ("placeholder", n)
    } else {
        ("function", name)
    };
    let kind = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| inferred.to_string());
    let optional = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    object([
        ("type", Some(kind)),
        ("name", Some(bare.to_string())),
        ("description", optional(3)),
        ("url", optional(4)),
    ])
}

struct TypedName {
    kind: Option<String>,
    name: Option<String>,
    default: Option<String>,
    description: Option<String>,
}

fn typed_name(raw: &str) -> TypedName {
    let caps = RE_PARAMETER.captures(raw);
    let group = |i: usize| {
        caps.as_ref()
            .and_then(|c| c.get(i))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };
    TypedName {
        kind: group(1),
        name: group(2),
        default: group(3),
        description: group(4),
    }
}

// -- Helpers ------------------------------------------------------------------

/// JSON object with the present fields only.
fn object<const N: usize>(fields: [(&str, Option<String>); N]) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key.to_string(), Value::String(v))))
        .collect();
    Value::Object(map)
}

/// Remove the indentation shared by all non-blank lines.
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()).trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}
