//! Parser — drives lexer, block parser, validator and resolver per file.
//!
//! Each fed file goes through the synchronous front half right away; its
//! resolve steps are queued and run while [`ParseStream::finish`] is awaited.
//! The run is all-or-nothing: the first error wins and no records are
//! returned.

use crate::annotation::Registry;
use crate::block;
use crate::config::{Config, Options};
use crate::error::{Error, Result};
use crate::lexer;
use crate::logger::Logger;
use crate::model::{ContextKind, DocumentationRecord, PosterComment, SourceUnit, Warning};
use crate::resolve;
use crate::validate;
use futures::future::BoxFuture;
use futures::stream::{FuturesOrdered, StreamExt};
use std::sync::Arc;

/// Records and warnings of one file, before resolution.
#[derive(Debug, Default)]
pub struct FileOutcome {
    pub records: Vec<DocumentationRecord>,
    pub poster: Option<PosterComment>,
    pub warnings: Vec<Warning>,
}

#[derive(Clone)]
pub struct Parser {
    registry: Arc<Registry>,
    options: Options,
    logger: Arc<dyn Logger>,
}

impl Parser {
    pub fn new(config: Config) -> Result<Self> {
        let registry = Registry::from_config(&config)?;
        Ok(Parser {
            registry: Arc::new(registry),
            options: config.options,
            logger: config.logger,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Lex, parse and validate one file. Warnings go to the logger and are
    /// also returned.
    pub fn parse(&self, path: &str, source: &str) -> Result<FileOutcome> {
        let mut lexed = lexer::lex(path, source)?;
        let mut warnings = std::mem::take(&mut lexed.warnings);

        let poster = lexed.poster().map(|b| {
            let parsed = block::parse_block(&b.block, &self.registry);
            let (poster, poster_warnings) = validate::poster(parsed, &b.block, &self.registry);
            warnings.extend(poster_warnings);
            poster
        });

        let mut records = Vec::new();
        for lexed_block in lexed.blocks {
            let Some(context) = lexed_block.context else {
                continue;
            };
            let parsed = block::parse_block(&lexed_block.block, &self.registry);
            let record = validate::record(
                parsed,
                &lexed_block.block,
                context,
                poster.as_ref(),
                &self.registry,
            );
            warnings.extend(record.warnings.iter().map(|message| {
                Warning::new(message.as_str(), &record.file.path, record.line.start)
            }));
            records.push(record);
        }

        if !self.options.include_unknown_contexts {
            records.retain(|r| r.context.kind != ContextKind::Unknown);
        }

        for warning in &warnings {
            self.logger.warn(&warning.to_string());
        }
        tracing::debug!(path, records = records.len(), warnings = warnings.len(), "parsed file");

        Ok(FileOutcome {
            records,
            poster,
            warnings,
        })
    }

    /// Start a run that files can be fed into.
    pub fn stream(&self) -> ParseStream {
        ParseStream {
            parser: self.clone(),
            pending: FuturesOrdered::new(),
            error: None,
        }
    }
}

/// One parse run: feed files, then await [`ParseStream::finish`].
pub struct ParseStream {
    parser: Parser,
    pending: FuturesOrdered<BoxFuture<'static, Result<Vec<DocumentationRecord>>>>,
    error: Option<Error>,
}

impl ParseStream {
    /// Process one file. After the first error further input is ignored.
    pub fn feed(&mut self, unit: SourceUnit) {
        if self.error.is_some() {
            return;
        }
        match self.parser.parse(&unit.path, &unit.content) {
            Ok(outcome) => {
                let resolution = resolve::resolve_file(outcome.records, &self.parser.registry);
                self.pending.push_back(resolution);
            }
            Err(err) => self.error = Some(err),
        }
    }

    /// The input side reports an error; the run will reject with it.
    pub fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Wait for every queued resolution; records come back in file order,
    /// then comment order.
    pub async fn finish(mut self) -> Result<Vec<DocumentationRecord>> {
        if let Some(err) = self.error.take() {
            return Err(self.reject(err));
        }

        let mut records = Vec::new();
        while let Some(file) = self.pending.next().await {
            match file {
                Ok(mut resolved) => records.append(&mut resolved),
                Err(err) => return Err(self.reject(err)),
            }
        }
        Ok(records)
    }

    fn reject(&self, err: Error) -> Error {
        self.parser.logger.error(&err.to_string());
        err
    }
}
