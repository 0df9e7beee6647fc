//! Pipeline assembly from configuration.

use crate::error::PipelineError;
use crate::factory::{ChangesetFactory, SystemChangesetFactory};
use crate::unit::UnitOfWork;
use std::sync::Arc;
use tracing::debug;
use warden_audit_filter::FilterProviderBuilder;
use warden_audit_processor::FilteredProcessor;
use warden_audit_sink::{AuditSink, ChainSink, JsonLinesSink, LogSink};
use warden_common_config::{PipelineConfig, SinkConfig, WardenConfig};

/// Builds a [`UnitOfWork`] from a [`PipelineConfig`].
///
/// Filters from the configured lists come first; extra filters and sinks
/// registered on the builder are added next to them. Without an explicit
/// factory, changesets are attributed with [`SystemChangesetFactory`].
pub struct PipelineBuilder {
    name: String,
    config: PipelineConfig,
    filters: FilterProviderBuilder,
    sinks: Vec<Box<dyn AuditSink>>,
    factory: Option<Arc<dyn ChangesetFactory>>,
}

impl PipelineBuilder {
    /// Builder for pipeline `name` described by `config`.
    pub fn new(name: impl Into<String>, config: PipelineConfig) -> Self {
        Self {
            name: name.into(),
            config,
            filters: FilterProviderBuilder::default(),
            sinks: Vec::new(),
            factory: None,
        }
    }

    /// Start from the named pipeline of a loaded configuration.
    pub fn from_config(config: &WardenConfig, name: &str) -> Result<Self, PipelineError> {
        let pipeline = config
            .pipeline(name)
            .ok_or_else(|| PipelineError::UnknownPipeline {
                name: name.to_string(),
            })?;
        Ok(Self::new(name, pipeline.clone()))
    }

    /// Register additional filters.
    pub fn filters<F>(mut self, register: F) -> Self
    where
        F: FnOnce(FilterProviderBuilder) -> FilterProviderBuilder,
    {
        self.filters = register(self.filters);
        self
    }

    /// Deliver to `sink` after the configured sinks.
    pub fn sink<S: AuditSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Attribute changesets through `factory` instead of the system factory.
    pub fn factory(mut self, factory: Arc<dyn ChangesetFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Validate the configuration and assemble the unit of work.
    pub fn build(self) -> Result<UnitOfWork, PipelineError> {
        self.config.validate(&self.name, None)?;

        let provider = self.filters.with_config(&self.config.filters)?.build();
        let processor = FilteredProcessor::new(Arc::new(provider), self.config.filters.default)
            .with_empty_changeset(self.config.empty_changeset);

        let mut chain = ChainSink::new();
        for sink in &self.config.sinks {
            match sink {
                SinkConfig::Log => chain.push(LogSink),
                SinkConfig::JsonLines { path } => chain.push(JsonLinesSink::open(path)?),
            }
        }
        chain.extend(self.sinks);

        let factory: Arc<dyn ChangesetFactory> = match self.factory {
            Some(factory) => factory,
            None => Arc::new(SystemChangesetFactory::new()),
        };

        debug!(
            pipeline = %self.name,
            sinks = chain.len(),
            empty_changeset = ?self.config.empty_changeset,
            "Pipeline built"
        );
        Ok(UnitOfWork::new(Arc::new(processor), Arc::new(chain), factory))
    }
}
