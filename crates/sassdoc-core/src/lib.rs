//! sassdoc-core — documentation extraction for SCSS doc comments.
//!
//! Pipeline per file: [`lexer`] finds `///` and `////` comment blocks and
//! the declaration after each ([`context`]), [`block`] parses `@name`
//! statements through the annotation [`Registry`](annotation::Registry),
//! [`validate`] enforces where and how often annotations may appear, and
//! [`resolve`] runs asynchronous resolve steps. [`Parser`] ties these
//! together; [`sort()`] orders the result.

pub mod annotation;
pub mod block;
pub mod config;
pub mod context;
pub mod error;
pub mod lexer;
pub mod logger;
pub mod model;
pub mod parser;
pub mod resolve;
pub mod sort;
pub mod source;
pub mod validate;

pub use annotation::{AnnotationDescriptor, Registry};
pub use config::{Config, Options};
pub use error::{BoxError, Error, Result};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use model::{
    AnnotationValue, Context, ContextKind, DocumentationRecord, SourceUnit, Warning,
};
pub use parser::{FileOutcome, ParseStream, Parser};
pub use sort::sort;

/// Parse every source matched by `patterns` and return the sorted records.
pub async fn parse<S: AsRef<str>>(patterns: &[S], config: Config) -> Result<Vec<DocumentationRecord>> {
    let parser = Parser::new(config)?;
    let mut stream = parser.stream();
    match source::collect(patterns) {
        Ok(units) => {
            for unit in units {
                stream.feed(unit);
            }
        }
        Err(err) => stream.fail(err),
    }
    let records = stream.finish().await?;
    Ok(sort(records))
}
