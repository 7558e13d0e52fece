//! The generation session
//!
//! A [`Generator`] owns everything that lives longer than one mapping method: the type
//! source, configuration, user conversion rules and the shape cache. Each method is planned,
//! verified and emitted on its own, and a failing method never affects another.

mod planner;

use std::sync::Arc;

use error_stack::Report;
use tracing::{error, info};

use self::planner::Planner;
use crate::config::GeneratorConfig;
use crate::convert::{ConversionRegistry, ConversionRule};
use crate::emit::Emitter;
use crate::error::{Error, Result};
use crate::inflection::Inflector;
use crate::method::MappingMethod;
use crate::shape::ShapeCache;
use crate::type_source::TypeSource;
use crate::verify::{FailureContractVerifier, VerifiedPlan};

/// A mapping method that could not be generated
#[derive(Debug)]
pub struct MethodFailure {
    /// Name of the rejected method
    pub method: String,
    /// Why it was rejected
    pub error:  Report<Error>,
}

/// Outcome of generating a batch of methods
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Output of every method that was generated, in input order
    pub generated: Vec<T>,
    /// Every method that was rejected, in input order
    pub failures:  Vec<MethodFailure>,
}

impl<T> BatchReport<T> {
    /// Whether every method was generated
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Names of the rejected methods
    pub fn failed_methods(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|failure| failure.method.as_str())
            .collect()
    }
}

/// Plans, verifies and emits mapping methods against one type source
pub struct Generator<S> {
    types:       S,
    config:      GeneratorConfig,
    conversions: ConversionRegistry,
    shapes:      Arc<ShapeCache>,
    inflector:   Inflector,
}

impl<S: TypeSource> Generator<S> {
    /// Create a generator with its own shape cache
    pub fn new(types: S, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let inflector = Inflector::new(&config.singular_overrides);
        Ok(Self {
            types,
            config,
            conversions: ConversionRegistry::new(),
            shapes: Arc::new(ShapeCache::new()),
            inflector,
        })
    }

    /// Register a user conversion rule
    #[must_use]
    pub fn with_conversion(mut self, rule: ConversionRule) -> Self {
        self.conversions.register(rule);
        self
    }

    /// Register every rule of `registry`
    #[must_use]
    pub fn with_conversions(mut self, registry: ConversionRegistry) -> Self {
        for rule in registry.rules() {
            self.conversions.register(rule.clone());
        }
        self
    }

    /// Share a shape cache with other generators using the same singular overrides
    #[must_use]
    pub fn with_shape_cache(mut self, shapes: Arc<ShapeCache>) -> Self {
        self.shapes = shapes;
        self
    }

    /// The shape cache of this generator
    pub const fn shape_cache(&self) -> &Arc<ShapeCache> {
        &self.shapes
    }

    /// The session configuration
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Plan and verify one method
    ///
    /// `declared` lists the other mapping methods of the session; they are reused for
    /// nested bean-to-bean properties before any method is derived.
    pub fn plan(&self, method: &MappingMethod, declared: &[MappingMethod]) -> Result<VerifiedPlan> {
        let mut planner = Planner::new(
            &self.types,
            &self.config,
            &self.conversions,
            &self.shapes,
            &self.inflector,
            declared,
            method,
        );
        let plan = planner
            .plan_method(method)
            .map_err(|report| report.attach(format!("Mapping method: {}", method.name)))?;
        FailureContractVerifier::new(&self.types).verify(method, plan)
    }

    /// Plan, verify and emit one method
    pub fn generate<E: Emitter>(
        &self,
        method: &MappingMethod,
        declared: &[MappingMethod],
        emitter: &mut E,
    ) -> Result<E::Output> {
        let plan = self.plan(method, declared)?;
        emitter.emit(method, plan)
    }

    /// Generate every method, continuing past rejected ones
    pub fn generate_all<E: Emitter>(
        &self,
        methods: &[MappingMethod],
        emitter: &mut E,
    ) -> BatchReport<E::Output> {
        let mut report = BatchReport {
            generated: Vec::new(),
            failures:  Vec::new(),
        };

        for method in methods {
            match self.generate(method, methods, emitter) {
                Ok(output) => report.generated.push(output),
                Err(e) => {
                    error!(
                        method = %method.name,
                        category = e.current_context().category(),
                        "Mapping method rejected: {}",
                        e.current_context()
                    );
                    report.failures.push(MethodFailure {
                        method: method.name.clone(),
                        error:  e,
                    });
                },
            }
        }

        info!(
            generated = report.generated.len(),
            rejected = report.failures.len(),
            "Generation pass finished"
        );
        report
    }
}
