//! Block parser — splits a comment block into description and `@name`
//! statements and runs each statement through its registered parser.

use crate::annotation::Registry;
use crate::model::{CommentBlock, Warning};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `@name rest-of-line`; only lines that start with `@` open a statement,
/// indented lines (e.g. example code) are continuations.
static RE_STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([\w-]+)(.*)$").unwrap());

/// Parsed but not yet validated block.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedBlock {
    pub description: String,
    /// Values per canonical annotation name, in encounter order.
    pub annotations: BTreeMap<String, Vec<Value>>,
    pub warnings: Vec<Warning>,
}

struct Statement {
    name: String,
    line: usize,
    raw: String,
}

pub fn not_found(name: &str) -> String {
    format!("Parser for annotation `{}` not found.", name)
}

pub fn parse_block(block: &CommentBlock, registry: &Registry) -> ParsedBlock {
    let mut description: Vec<&str> = Vec::new();
    let mut statements: Vec<Statement> = Vec::new();

    for (offset, line) in block.lines.iter().enumerate() {
        if let Some(caps) = RE_STATEMENT.captures(line) {
            statements.push(Statement {
                name: caps[1].to_string(),
                line: block.start_line + offset,
                raw: caps[2].trim().to_string(),
            });
        } else if let Some(current) = statements.last_mut() {
            current.raw.push('\n');
            current.raw.push_str(line);
        } else {
            description.push(line);
        }
    }

    let mut parsed = ParsedBlock {
        description: description.join("\n").trim().to_string(),
        ..ParsedBlock::default()
    };

    for statement in statements {
        match registry.get(&statement.name) {
            Some(descriptor) => {
                let value = descriptor.parse(&statement.raw);
                parsed
                    .annotations
                    .entry(descriptor.name.clone())
                    .or_default()
                    .push(value);
            }
            None => parsed.warnings.push(Warning::new(
                not_found(&statement.name),
                &block.path,
                statement.line,
            )),
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationDescriptor;
    use serde_json::json;

    fn block(lines: &[&str]) -> CommentBlock {
        CommentBlock {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            is_poster: false,
            path: "test.scss".to_string(),
            start_line: 10,
            end_line: 10 + lines.len() - 1,
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(AnnotationDescriptor::new("raw", |raw| json!(raw)).alias("r"));
        registry
    }

    #[test]
    fn description_only() {
        let parsed = parse_block(&block(&["", "  Some text", "more", ""]), &registry());
        assert_eq!(parsed.description, "Some text\nmore");
        assert!(parsed.annotations.is_empty());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn statements_collect_continuation_lines() {
        let parsed = parse_block(
            &block(&["Desc", "@raw first", "  second", "@r{x} third", "not an @annotation"]),
            &registry(),
        );
        assert_eq!(parsed.description, "Desc");
        assert_eq!(
            parsed.annotations["raw"],
            vec![json!("first\n  second"), json!("{x} third\nnot an @annotation")]
        );
    }

    #[test]
    fn indented_at_lines_are_continuations() {
        let parsed = parse_block(&block(&["@raw", "  @include thing;"]), &registry());
        assert_eq!(parsed.annotations["raw"], vec![json!("\n  @include thing;")]);
    }

    #[test]
    fn unknown_annotation_warns_and_is_skipped() {
        let parsed = parse_block(&block(&["desc", "@shouldfail fail", "  more", "@raw ok"]), &registry());
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].message, "Parser for annotation `shouldfail` not found.");
        assert_eq!(parsed.warnings[0].line, 11);
        assert!(!parsed.annotations.contains_key("shouldfail"));
        assert_eq!(parsed.annotations["raw"], vec![json!("ok")]);
    }
}
