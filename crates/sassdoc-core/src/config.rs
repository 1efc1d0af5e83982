//! Parser configuration.

use crate::annotation::AnnotationDescriptor;
use crate::logger::{Logger, TracingLogger};
use serde::Deserialize;
use std::sync::Arc;

/// Group of records without `@group`, unless configured otherwise.
pub const DEFAULT_GROUP: &str = "undefined";

/// Plain options, loadable from a JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Keep records whose comment precedes no declaration.
    pub include_unknown_contexts: bool,
    /// Group assigned to records without `@group`.
    pub default_group: String,
    /// `@example` type when none is given.
    pub example_type: String,
    /// Names matching this regex get `@access private` by default.
    pub private_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            include_unknown_contexts: false,
            default_group: DEFAULT_GROUP.to_string(),
            example_type: "scss".to_string(),
            private_prefix: "^[_-]".to_string(),
        }
    }
}

/// Runtime configuration: options plus the logger and extra annotations.
#[derive(Clone)]
pub struct Config {
    pub options: Options,
    pub logger: Arc<dyn Logger>,
    /// Merged over the built-in registry; later entries win on name clash.
    pub annotations: Vec<AnnotationDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            options: Options::default(),
            logger: Arc::new(TracingLogger),
            annotations: Vec::new(),
        }
    }
}

impl Config {
    pub fn with_options(options: Options) -> Self {
        Config {
            options,
            ..Config::default()
        }
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn annotation(mut self, descriptor: AnnotationDescriptor) -> Self {
        self.annotations.push(descriptor);
        self
    }

    pub fn include_unknown_contexts(mut self, include: bool) -> Self {
        self.options.include_unknown_contexts = include;
        self
    }
}
