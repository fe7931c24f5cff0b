//! Concrete rules.

mod ownership;
mod required_fields;

pub use ownership::{InMemoryAccessor, ResourceAccessor, ResourceOwnership};
pub use required_fields::{DEFAULT_MUTATING_METHODS, RequiredFields};

use crate::{CallerIdentity, RuleSet};

/// Required fields first, then ownership of the addressed resource.
///
/// The accessor is never consulted when a field is missing.
pub struct OwnershipWithFields;

impl OwnershipWithFields {
    pub fn new<C, A>(fields: RequiredFields, accessor: A) -> RuleSet<C>
    where
        C: CallerIdentity + PartialEq + 'static,
        A: ResourceAccessor<C> + 'static,
    {
        RuleSet::new("ownership_with_fields")
            .with(fields)
            .with(ResourceOwnership::new(accessor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Caller, Outcome, RequestContext, ResourceKey, Rule};
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        inner: InMemoryAccessor<Caller>,
        fetches: AtomicUsize,
    }

    impl ResourceAccessor<Caller> for Counting {
        type Resource = Vec<Caller>;
        type Error = Infallible;

        fn fetch(&self, key: &ResourceKey) -> Result<Option<Vec<Caller>>, Infallible> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(key)
        }

        fn relation_fields_of(&self, resource: &Vec<Caller>) -> Vec<Caller> {
            resource.clone()
        }
    }

    fn counting() -> Arc<Counting> {
        Arc::new(Counting {
            inner: InMemoryAccessor::new().with("1", vec![Caller::user("alice")]),
            fetches: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_missing_fields_skip_accessor() {
        let accessor = counting();
        let rule = OwnershipWithFields::new(
            RequiredFields::new(["cat", "dog"]).unwrap(),
            accessor.clone(),
        );
        let ctx = RequestContext::builder("POST", Caller::user("alice"))
            .field("cat")
            .resource_key("1")
            .build();

        let outcome = rule.evaluate(&ctx).unwrap();
        assert_eq!(outcome.failure().unwrap().message, "Missing keys dog");
        assert_eq!(accessor.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fields_present_then_ownership_decides() {
        let accessor = counting();
        let rule = OwnershipWithFields::new(
            RequiredFields::new(["cat", "dog"]).unwrap(),
            accessor.clone(),
        );
        let ctx = |caller: Caller| {
            RequestContext::builder("POST", caller)
                .fields(["cat", "dog"])
                .resource_key("1")
                .build()
        };

        assert_eq!(
            rule.evaluate(&ctx(Caller::user("eve"))).unwrap(),
            Outcome::unauthorized()
        );
        assert_eq!(
            rule.evaluate(&ctx(Caller::user("alice"))).unwrap(),
            Outcome::Pass
        );
        assert_eq!(accessor.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(rule.rule_names(), vec!["required_fields", "resource_ownership"]);
    }
}
