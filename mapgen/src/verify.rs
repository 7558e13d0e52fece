//! Static failure-contract check
//!
//! Every failure an action may raise must be covered by the declared failures of the method
//! containing it. A failure is covered when it, or one of its ancestors, is declared.
//! Unchecked failures are always covered and reach the caller exactly as raised.

use std::collections::BTreeSet;

use error_stack::Report;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::method::MappingMethod;
use crate::plan::MappingPlan;
use crate::type_name::TypeName;
use crate::type_source::{TypeKind, TypeSource};

/// A plan whose failure contract has been checked
///
/// Only the verifier creates these, so an emitter can never see an unchecked plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPlan {
    plan:    MappingPlan,
    checked: BTreeSet<TypeName>,
}

impl VerifiedPlan {
    /// The checked plan
    pub const fn plan(&self) -> &MappingPlan {
        &self.plan
    }

    /// Whether `failure` is a checked failure that must travel through the method contract
    ///
    /// Covers every failure named by the plan, its nested plans and their declared
    /// contracts. Unchecked failures answer `false` and are never routed or translated.
    pub fn is_checked(&self, failure: &TypeName) -> bool {
        self.checked.contains(failure)
    }

    /// The checked failures among `failures`
    pub fn checked<'a>(&'a self, failures: &'a [TypeName]) -> impl Iterator<Item = &'a TypeName> {
        failures.iter().filter(|failure| self.is_checked(failure))
    }

    /// Unwrap the checked plan
    pub fn into_inner(self) -> MappingPlan {
        self.plan
    }
}

/// Checks plans against the declared failures of their methods
pub struct FailureContractVerifier<'a> {
    types: &'a dyn TypeSource,
}

impl<'a> FailureContractVerifier<'a> {
    /// Create a verifier resolving failure ancestry through `types`
    pub const fn new(types: &'a dyn TypeSource) -> Self {
        Self { types }
    }

    /// Check `plan`, including the nested plans it derived, and seal it
    pub fn verify(&self, method: &MappingMethod, plan: MappingPlan) -> Result<VerifiedPlan> {
        let mut checked = BTreeSet::new();
        self.verify_plan(&plan, &mut checked)
            .map_err(|report| report.attach(format!("Mapping method: {}", method.name)))?;
        debug!(method = %method.name, properties = plan.properties.len(), "Failure contract verified");
        Ok(VerifiedPlan { plan, checked })
    }

    fn verify_plan(&self, plan: &MappingPlan, checked: &mut BTreeSet<TypeName>) -> Result<()> {
        checked.extend(
            plan.declared_failures
                .iter()
                .filter(|failure| !self.is_unchecked(failure))
                .cloned(),
        );
        for property in &plan.properties {
            for invocation in property.invocations() {
                for failure in invocation.failures {
                    if self.is_unchecked(failure) {
                        trace!(%failure, invoked = invocation.invoked, "Unchecked failure passes through");
                        continue;
                    }
                    checked.insert(failure.clone());
                    if self.is_covered(failure, &plan.declared_failures) {
                        continue;
                    }
                    return Err(Report::new(Error::UndeclaredFailure {
                        method:    plan.method.clone(),
                        property:  property.target.name.clone(),
                        raised_by: invocation.invoked.to_string(),
                        failure:   failure.clone(),
                    }));
                }
            }
        }
        for nested in plan.nested_plans() {
            self.verify_plan(nested, checked)?;
        }
        Ok(())
    }

    /// Whether `failure` needs no declaration
    ///
    /// A failure type the host cannot describe is treated as checked.
    pub fn is_unchecked(&self, failure: &TypeName) -> bool {
        std::iter::once(failure.clone())
            .chain(self.types.ancestors(failure))
            .any(|name| {
                self.types.describe(&name).is_some_and(|descriptor| {
                    matches!(descriptor.kind, TypeKind::Failure { unchecked: true })
                })
            })
    }

    /// Whether `failure` or one of its ancestors is in `declared`
    pub fn is_covered(&self, failure: &TypeName, declared: &[TypeName]) -> bool {
        declared
            .iter()
            .any(|declared| self.types.is_assignable(failure, declared))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn test_coverage_follows_ancestry() {
        let types = test_support::registry();
        let verifier = FailureContractVerifier::new(&types);

        let cases = [
            ("DogException", vec!["DogException"], true),
            ("DogException", vec!["Exception"], true),
            ("DogException", vec!["CatException"], false),
            ("DogException", vec![], false),
        ];
        for (failure, declared, covered) in cases {
            let declared: Vec<TypeName> = declared.into_iter().map(TypeName::from).collect();
            assert_eq!(
                verifier.is_covered(&failure.into(), &declared),
                covered,
                "Failed for: {failure} in {declared:?}"
            );
        }
    }

    #[test]
    fn test_unchecked_is_inherited() {
        let types = test_support::registry();
        let verifier = FailureContractVerifier::new(&types);

        assert!(verifier.is_unchecked(&"RuntimeException".into()));
        assert!(verifier.is_unchecked(&"CatException".into()));
        assert!(!verifier.is_unchecked(&"DogException".into()));
        assert!(!verifier.is_unchecked(&"NotDescribedException".into()));
    }

    #[test]
    fn test_verified_plan_separates_checked_failures() {
        let generator = test_support::generator();
        let verified = generator
            .plan(&test_support::source_to_target(), &[])
            .expect("source_to_target verifies");

        assert!(verified.is_checked(&"DogException".into()));
        assert!(!verified.is_checked(&"CatException".into()));

        let raised: Vec<TypeName> = vec!["DogException".into(), "CatException".into()];
        let checked: Vec<&TypeName> = verified.checked(&raised).collect();
        assert_eq!(checked, vec![&TypeName::from("DogException")]);
    }
}
