//! Resolver — runs annotations' asynchronous resolve steps.
//!
//! A record is only handed back once every one of its resolve steps has
//! completed. Steps of one record run one after another (each gets the
//! record mutably); records of a file resolve concurrently.

use crate::annotation::{Registry, ResolveFn};
use crate::error::{Error, Result};
use crate::model::DocumentationRecord;
use futures::future::{self, BoxFuture, FutureExt};

/// Resolve every record of one file, keeping their order.
pub fn resolve_file(
    records: Vec<DocumentationRecord>,
    registry: &Registry,
) -> BoxFuture<'static, Result<Vec<DocumentationRecord>>> {
    let pending: Vec<_> = records
        .into_iter()
        .map(|record| {
            let steps = steps_for(&record, registry);
            (record, steps)
        })
        .collect();

    if pending.iter().all(|(_, steps)| steps.is_empty()) {
        let records = pending.into_iter().map(|(record, _)| record).collect();
        return future::ready(Ok(records)).boxed();
    }

    future::try_join_all(
        pending
            .into_iter()
            .map(|(record, steps)| resolve_record(record, steps)),
    )
    .boxed()
}

/// Annotations present on the record that carry a resolve step.
fn steps_for(record: &DocumentationRecord, registry: &Registry) -> Vec<(String, ResolveFn)> {
    record
        .annotations
        .keys()
        .filter_map(|name| {
            let resolve = registry.get(name)?.resolver()?;
            Some((name.clone(), resolve.clone()))
        })
        .collect()
}

async fn resolve_record(
    mut record: DocumentationRecord,
    steps: Vec<(String, ResolveFn)>,
) -> Result<DocumentationRecord> {
    for (annotation, resolve) in steps {
        if let Err(source) = resolve(&mut record).await {
            return Err(Error::Resolve {
                annotation,
                path: record.file.path.clone(),
                line: record.line.start,
                source,
            });
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationDescriptor;
    use crate::error::BoxError;
    use crate::model::{AnnotationValue, Context, FileInfo, LineRange};
    use serde_json::{json, Map};
    use std::collections::BTreeMap;

    fn record_with(names: &[&str]) -> DocumentationRecord {
        DocumentationRecord {
            description: String::new(),
            context: Context::unknown(2),
            annotations: names
                .iter()
                .map(|n| (n.to_string(), AnnotationValue::Single(json!(""))))
                .collect::<BTreeMap<_, _>>(),
            warnings: Vec::new(),
            file: FileInfo::new("a.scss"),
            line: LineRange { start: 1, end: 1 },
            extra: Map::new(),
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(AnnotationDescriptor::new("plain", |raw| json!(raw)));
        registry.register(AnnotationDescriptor::new("tag", |raw| json!(raw)).resolve(|record| {
            async move {
                record.extra.insert("tagged".into(), json!(true));
                Ok::<_, BoxError>(())
            }
            .boxed()
        }));
        registry.register(AnnotationDescriptor::new("broken", |raw| json!(raw)).resolve(|_| {
            async move { Err::<(), BoxError>("lookup failed".into()) }.boxed()
        }));
        registry
    }

    #[tokio::test]
    async fn records_without_steps_pass_through() {
        let records = vec![record_with(&["plain"]), record_with(&[])];
        let out = resolve_file(records.clone(), &registry()).await.unwrap();
        assert_eq!(out, records);
    }

    #[tokio::test]
    async fn steps_mutate_only_their_record() {
        let records = vec![record_with(&["plain"]), record_with(&["tag"])];
        let out = resolve_file(records, &registry()).await.unwrap();
        assert!(out[0].extra.is_empty());
        assert_eq!(out[1].extra["tagged"], json!(true));
    }

    #[tokio::test]
    async fn failing_step_names_the_annotation() {
        let err = resolve_file(vec![record_with(&["tag", "broken"])], &registry())
            .await
            .unwrap_err();
        match err {
            Error::Resolve { annotation, line, .. } => {
                assert_eq!(annotation, "broken");
                assert_eq!(line, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
