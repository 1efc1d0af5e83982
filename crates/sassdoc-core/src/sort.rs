//! Deterministic ordering of the final record array.

use crate::config::DEFAULT_GROUP;
use crate::model::DocumentationRecord;

/// Order by group, then context kind, then context name.
///
/// The sort is stable, so equal keys keep their encounter order.
pub fn sort(mut records: Vec<DocumentationRecord>) -> Vec<DocumentationRecord> {
    records.sort_by(|a, b| {
        let group_a = a.group().unwrap_or(DEFAULT_GROUP);
        let group_b = b.group().unwrap_or(DEFAULT_GROUP);
        group_a
            .cmp(group_b)
            .then_with(|| a.context.kind.cmp(&b.context.kind))
            .then_with(|| a.context.name.cmp(&b.context.name))
    });
    records
}
