//! Validator — enforces where annotations may appear and how often, then
//! turns a validated block into its final record shape.

use crate::annotation::Registry;
use crate::block::ParsedBlock;
use crate::model::{
    AnnotationValue, CommentBlock, Context, ContextKind, DocumentationRecord, FileInfo, LineRange,
    PosterComment, Warning,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub fn not_allowed(name: &str, kind: ContextKind) -> String {
    format!(
        "Annotation `{}` is not allowed on comment from type `{}`.",
        name, kind
    )
}

pub fn only_once(name: &str) -> String {
    format!(
        "Annotation `{}` is only allowed once per comment, second value will be ignored.",
        name
    )
}

/// Drop values that break the registry's rules, warning once per rule broken.
///
/// `kind` is `None` for the poster comment, which has no context to check.
/// The first value of a single-valued annotation wins.
pub fn validate(
    annotations: &mut BTreeMap<String, Vec<Value>>,
    kind: Option<ContextKind>,
    registry: &Registry,
    path: &str,
    line: usize,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    annotations.retain(|name, values| {
        let Some(descriptor) = registry.get(name) else {
            return false;
        };
        if let Some(kind) = kind {
            if !descriptor.allows(kind) {
                warnings.push(Warning::new(not_allowed(name, kind), path, line));
                return false;
            }
        }
        if !descriptor.multiple && values.len() > 1 {
            warnings.push(Warning::new(only_once(name), path, line));
            values.truncate(1);
        }
        true
    });

    warnings
}

/// Validate a poster block into the file-level comment.
pub fn poster(parsed: ParsedBlock, block: &CommentBlock, registry: &Registry) -> (PosterComment, Vec<Warning>) {
    let ParsedBlock {
        description,
        mut annotations,
        mut warnings,
    } = parsed;
    warnings.extend(validate(&mut annotations, None, registry, &block.path, block.start_line));
    let poster = PosterComment {
        description,
        annotations,
        line: LineRange {
            start: block.start_line,
            end: block.end_line,
        },
    };
    (poster, warnings)
}

/// Validate a doc block and build its record.
///
/// After validation the record inherits the poster's annotations it does not
/// declare itself, absent annotations are autofilled, and values collapse to
/// their final single/multiple shape.
pub fn record(
    parsed: ParsedBlock,
    block: &CommentBlock,
    context: Context,
    poster: Option<&PosterComment>,
    registry: &Registry,
) -> DocumentationRecord {
    let ParsedBlock {
        description,
        mut annotations,
        mut warnings,
    } = parsed;
    warnings.extend(validate(
        &mut annotations,
        Some(context.kind),
        registry,
        &block.path,
        block.start_line,
    ));

    if let Some(poster) = poster {
        for (name, values) in &poster.annotations {
            let allowed = registry.get(name).is_some_and(|d| d.allows(context.kind));
            if allowed && !annotations.contains_key(name) {
                annotations.insert(name.clone(), values.clone());
            }
        }
    }

    let mut record = DocumentationRecord {
        description,
        context,
        annotations: BTreeMap::new(),
        warnings: warnings.iter().map(|w| w.message.clone()).collect(),
        file: FileInfo::new(&block.path),
        line: LineRange {
            start: block.start_line,
            end: block.end_line,
        },
        extra: Map::new(),
    };
    record.annotations = collapse(annotations, registry);

    let filled: Vec<(String, Vec<Value>)> = registry
        .iter()
        .filter(|d| d.allows(record.context.kind) && !record.annotations.contains_key(&d.name))
        .filter_map(|d| {
            let values = (d.autofiller()?)(&record);
            (!values.is_empty()).then(|| (d.name.clone(), values))
        })
        .collect();
    record.annotations.extend(collapse(filled, registry));

    record
}

fn collapse(
    annotations: impl IntoIterator<Item = (String, Vec<Value>)>,
    registry: &Registry,
) -> BTreeMap<String, AnnotationValue> {
    annotations
        .into_iter()
        .filter_map(|(name, mut values)| {
            let multiple = registry.get(&name)?.multiple;
            let value = if multiple {
                AnnotationValue::Multiple(values)
            } else {
                values.truncate(1);
                AnnotationValue::Single(values.pop()?)
            };
            Some((name, value))
        })
        .collect()
}
