//! Builds the [`MappingPlan`] of one method, deriving nested methods on demand

use std::collections::HashMap;

use heck::ToSnakeCase;
use tracing::{debug, warn};

use crate::config::{CollectionStrategy, GeneratorConfig};
use crate::convert::{ConversionRegistry, ConversionResolver, NestedMapping, NestedMappings};
use crate::correlate::PropertyCorrelator;
use crate::error::Result;
use crate::inflection::Inflector;
use crate::method::{MappingMethod, PropertyOptions};
use crate::plan::{MappingPlan, PlannedProperty};
use crate::shape::{ShapeCache, ShapeIntrospector};
use crate::strategy::CollectionStrategySelector;
use crate::type_name::TypeName;
use crate::type_source::TypeSource;

type TypePair = (TypeName, TypeName);

/// Planning state for one root mapping method
pub(super) struct Planner<'g> {
    types:        &'g dyn TypeSource,
    config:       &'g GeneratorConfig,
    conversions:  &'g ConversionRegistry,
    inflector:    &'g Inflector,
    introspector: ShapeIntrospector<'g>,
    declared:     &'g [MappingMethod],
    /// Failure contract inherited by derived methods
    contract:     Vec<TypeName>,
    /// Strategy inherited by derived methods
    strategy:     CollectionStrategy,
    /// Methods being planned, outermost first
    in_progress:  Vec<(TypePair, String)>,
    derived:      HashMap<TypePair, NestedMapping>,
}

impl<'g> Planner<'g> {
    pub(super) fn new(
        types: &'g dyn TypeSource,
        config: &'g GeneratorConfig,
        conversions: &'g ConversionRegistry,
        cache: &'g ShapeCache,
        inflector: &'g Inflector,
        declared: &'g [MappingMethod],
        root: &MappingMethod,
    ) -> Self {
        Self {
            types,
            config,
            conversions,
            inflector,
            introspector: ShapeIntrospector::new(types, cache, inflector),
            declared,
            contract: root.declared_failures.clone(),
            strategy: root.strategy.unwrap_or(config.collection_strategy),
            in_progress: Vec::new(),
            derived: HashMap::new(),
        }
    }

    /// Name given to an automatically derived nested method
    fn derived_method_name(from: &TypeName, to: &TypeName) -> String {
        format!(
            "map_{}_to_{}",
            from.short_name().to_snake_case(),
            to.short_name().to_snake_case()
        )
    }

    pub(super) fn plan_method(&mut self, method: &MappingMethod) -> Result<MappingPlan> {
        let source = self.introspector.introspect(&method.source_type)?;
        let target = self.introspector.introspect_target(&method.target_type)?;

        let correlated = PropertyCorrelator::new(self.inflector, self.config.name_precedence)
            .correlate(&source, &target, &method.property_options)?;

        let strategy = method.strategy.unwrap_or(self.config.collection_strategy);
        let selector =
            CollectionStrategySelector::new(strategy, method.has_existing_target_parameter);
        let resolver = ConversionResolver::new(self.types, self.conversions);

        self.in_progress.push((
            (method.source_type.clone(), method.target_type.clone()),
            method.name.clone(),
        ));

        let mut properties = Vec::new();
        for pair in correlated {
            if selector.select(&pair, false).is_none() {
                continue;
            }

            let (from, to) = if CollectionStrategySelector::is_collection_pair(&pair) {
                (
                    pair.source.element_type.clone(),
                    pair.target.element_type.clone(),
                )
            } else {
                (
                    Some(pair.source.value_type.clone()),
                    Some(pair.target.value_type.clone()),
                )
            };
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            let hint = Self::hint(&method.property_options, &pair.target.name);

            let conversion = resolver
                .resolve(&pair.target.name, &from, &to, hint.as_ref(), self)
                .map_err(|report| report.attach(format!("Property: {}", pair.target.name)))?;

            let Some(action) = selector.select(&pair, conversion.is_some()) else {
                continue;
            };
            properties.push(PlannedProperty {
                source: pair.source,
                target: pair.target,
                action,
                conversion,
            });
        }

        self.in_progress.pop();

        debug!(
            method = %method.name,
            properties = properties.len(),
            "Planned mapping method"
        );
        Ok(MappingPlan {
            method: method.name.clone(),
            source_type: method.source_type.clone(),
            target_type: method.target_type.clone(),
            updates_existing_target: method.has_existing_target_parameter,
            declared_failures: method.declared_failures.clone(),
            properties,
        })
    }

    fn hint(options: &PropertyOptions, property: &str) -> Option<TypeName> {
        options.target_type_hint(property).cloned()
    }

    fn is_bean(&self, type_name: &TypeName) -> bool {
        self.types
            .describe(type_name)
            .is_some_and(|descriptor| descriptor.is_bean())
    }
}

impl NestedMappings for Planner<'_> {
    fn nested_mapping(&mut self, from: &TypeName, to: &TypeName) -> Result<Option<NestedMapping>> {
        if let Some(declared) = self
            .declared
            .iter()
            .find(|method| method.maps(from, to) && !method.has_existing_target_parameter)
        {
            return Ok(Some(NestedMapping {
                method:            declared.name.clone(),
                source_type:       from.clone(),
                target_type:       to.clone(),
                declared_failures: declared.declared_failures.clone(),
                plan:              None,
            }));
        }

        if !self.is_bean(from) || !self.is_bean(to) {
            return Ok(None);
        }

        let pair = (from.clone(), to.clone());
        if let Some((_, method)) = self.in_progress.iter().find(|(planning, _)| *planning == pair) {
            debug!(method = %method, "Referencing method still being planned");
            return Ok(Some(NestedMapping {
                method:            method.clone(),
                source_type:       from.clone(),
                target_type:       to.clone(),
                declared_failures: self.contract.clone(),
                plan:              None,
            }));
        }
        if let Some(derived) = self.derived.get(&pair) {
            debug!(method = %derived.method, "Referencing nested method already planned");
            return Ok(Some(derived.clone()));
        }

        let reference = NestedMapping {
            method:            Self::derived_method_name(from, to),
            source_type:       from.clone(),
            target_type:       to.clone(),
            declared_failures: self.contract.clone(),
            plan:              None,
        };
        if self.in_progress.len() >= self.config.max_nesting_depth {
            warn!(
                from = %from,
                to = %to,
                max_nesting_depth = self.config.max_nesting_depth,
                "Nesting limit reached; nested method not derived"
            );
            return Ok(None);
        }

        let method = MappingMethod {
            name:                          reference.method.clone(),
            source_type:                   from.clone(),
            target_type:                   to.clone(),
            has_existing_target_parameter: false,
            declared_failures:             self.contract.clone(),
            strategy:                      Some(self.strategy),
            property_options:              PropertyOptions::default(),
        };
        let plan = self.plan_method(&method).map_err(|report| {
            report.attach(format!("Derived nested method: {}", method.name))
        })?;

        self.derived.insert(pair, reference.clone());
        Ok(Some(NestedMapping {
            plan: Some(Box::new(plan)),
            ..reference
        }))
    }
}
