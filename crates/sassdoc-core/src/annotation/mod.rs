//! Annotation registry — name-keyed descriptors for `@name` statements.
//!
//! A descriptor says where an annotation may appear, whether it may repeat,
//! how its raw text is parsed, and optionally how it is resolved
//! asynchronously or filled in when absent. The registry is built once per
//! [`crate::Parser`] and is read-only afterwards.

pub mod builtin;

use crate::config::Config;
use crate::error::{BoxError, Result};
use crate::model::{ContextKind, DocumentationRecord};
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type ParseFn = Arc<dyn Fn(&str) -> Value + Send + Sync>;

pub type ResolveFn = Arc<
    dyn for<'a> Fn(&'a mut DocumentationRecord) -> BoxFuture<'a, std::result::Result<(), BoxError>>
        + Send
        + Sync,
>;

/// Values to use when the annotation is absent from a record.
pub type AutofillFn = Arc<dyn Fn(&DocumentationRecord) -> Vec<Value> + Send + Sync>;

#[derive(Clone)]
pub struct AnnotationDescriptor {
    pub name: String,
    pub aliases: Vec<String>,
    /// Context kinds the annotation may document; empty means all.
    pub allowed: Vec<ContextKind>,
    pub multiple: bool,
    parse: ParseFn,
    resolve: Option<ResolveFn>,
    autofill: Option<AutofillFn>,
}

impl AnnotationDescriptor {
    /// A multi-valued annotation allowed on every context.
    pub fn new<F>(name: impl Into<String>, parse: F) -> Self
    where
        F: Fn(&str) -> Value + Send + Sync + 'static,
    {
        AnnotationDescriptor {
            name: name.into(),
            aliases: Vec::new(),
            allowed: Vec::new(),
            multiple: true,
            parse: Arc::new(parse),
            resolve: None,
            autofill: None,
        }
    }

    /// Only the first occurrence per comment counts.
    pub fn single(mut self) -> Self {
        self.multiple = false;
        self
    }

    pub fn allowed_on(mut self, kinds: &[ContextKind]) -> Self {
        self.allowed = kinds.to_vec();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn resolve<F>(mut self, resolve: F) -> Self
    where
        F: for<'a> Fn(&'a mut DocumentationRecord) -> BoxFuture<'a, std::result::Result<(), BoxError>>
            + Send
            + Sync
            + 'static,
    {
        self.resolve = Some(Arc::new(resolve));
        self
    }

    pub fn autofill<F>(mut self, autofill: F) -> Self
    where
        F: Fn(&DocumentationRecord) -> Vec<Value> + Send + Sync + 'static,
    {
        self.autofill = Some(Arc::new(autofill));
        self
    }

    pub fn parse(&self, raw: &str) -> Value {
        (self.parse)(raw)
    }

    pub fn allows(&self, kind: ContextKind) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&kind)
    }

    pub fn resolver(&self) -> Option<&ResolveFn> {
        self.resolve.as_ref()
    }

    pub fn autofiller(&self) -> Option<&AutofillFn> {
        self.autofill.as_ref()
    }
}

impl fmt::Debug for AnnotationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("allowed", &self.allowed)
            .field("multiple", &self.multiple)
            .field("resolve", &self.resolve.is_some())
            .field("autofill", &self.autofill.is_some())
            .finish()
    }
}

/// Read-only lookup from annotation name (or alias) to descriptor.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    descriptors: HashMap<String, Arc<AnnotationDescriptor>>,
    aliases: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in annotations, then `config.annotations` in order.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        for descriptor in builtin::all(&config.options)? {
            registry.register(descriptor);
        }
        for descriptor in &config.annotations {
            registry.register(descriptor.clone());
        }
        Ok(registry)
    }

    /// Add a descriptor, replacing any previous one with the same name.
    pub fn register(&mut self, descriptor: AnnotationDescriptor) {
        for alias in &descriptor.aliases {
            self.aliases.insert(alias.clone(), descriptor.name.clone());
        }
        self.descriptors
            .insert(descriptor.name.clone(), Arc::new(descriptor));
    }

    /// Look up by name first, then by alias.
    pub fn get(&self, name: &str) -> Option<&Arc<AnnotationDescriptor>> {
        self.descriptors.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|canonical| self.descriptors.get(canonical))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<AnnotationDescriptor>> {
        self.descriptors.values()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
