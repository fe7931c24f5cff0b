//! Require the caller to be related to the addressed resource.

use crate::{CallerIdentity, Error, Outcome, RequestContext, ResourceKey, Result, Rule};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lookup collaborator for ownership checks.
///
/// The guard never inspects a resource itself; it asks the accessor for the
/// values of the resource's relation fields and compares each one to the
/// caller.
pub trait ResourceAccessor<C>: Send + Sync {
    type Resource;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolve a key. `Ok(None)` means the resource does not exist.
    fn fetch(
        &self,
        key: &ResourceKey,
    ) -> std::result::Result<Option<Self::Resource>, Self::Error>;

    fn relation_fields_of(&self, resource: &Self::Resource) -> Vec<C>;
}

impl<C, A: ResourceAccessor<C>> ResourceAccessor<C> for Arc<A> {
    type Resource = A::Resource;
    type Error = A::Error;

    fn fetch(
        &self,
        key: &ResourceKey,
    ) -> std::result::Result<Option<Self::Resource>, Self::Error> {
        (**self).fetch(key)
    }

    fn relation_fields_of(&self, resource: &Self::Resource) -> Vec<C> {
        (**self).relation_fields_of(resource)
    }
}

/// Checks, in order, that the resource exists (`404 Not found`), that the
/// caller is authenticated (`401`), and that the caller appears among the
/// resource's relation values (`401`).
#[derive(Debug, Clone)]
pub struct ResourceOwnership<A> {
    accessor: A,
}

impl<A> ResourceOwnership<A> {
    pub fn new(accessor: A) -> Self {
        Self { accessor }
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }
}

impl<C, A> Rule<C> for ResourceOwnership<A>
where
    C: CallerIdentity + PartialEq,
    A: ResourceAccessor<C>,
{
    fn name(&self) -> &'static str {
        "resource_ownership"
    }

    fn evaluate(&self, ctx: &RequestContext<C>) -> Result<Outcome> {
        let key = ctx.resource_key().ok_or(Error::NoResourceKey {
            rule: "resource_ownership",
        })?;

        let resource = match self.accessor.fetch(key) {
            Ok(Some(resource)) => resource,
            Ok(None) => {
                debug!(%key, "resource not found");
                return Ok(Outcome::not_found());
            }
            Err(e) => {
                warn!(%key, error = %e, "resource accessor failed");
                return Err(Error::Accessor {
                    rule: "resource_ownership",
                    source: Box::new(e),
                });
            }
        };

        let caller = ctx.caller();
        if !caller.is_authenticated() {
            debug!(%key, "unauthenticated caller");
            return Ok(Outcome::unauthorized());
        }

        let related = self
            .accessor
            .relation_fields_of(&resource)
            .iter()
            .any(|value| value == caller);
        if !related {
            debug!(%key, ?caller, "caller not related to resource");
            return Ok(Outcome::unauthorized());
        }

        Ok(Outcome::Pass)
    }

    fn requires_resource_key(&self) -> bool {
        true
    }
}

/// Accessor backed by an in-memory map of key to relation values.
///
/// Useful for testing and for dry runs of a route configuration.
#[derive(Debug, Clone)]
pub struct InMemoryAccessor<C> {
    resources: HashMap<ResourceKey, Vec<C>>,
}

impl<C> Default for InMemoryAccessor<C> {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }
}

impl<C> InMemoryAccessor<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<ResourceKey>, relations: Vec<C>) {
        self.resources.insert(key.into(), relations);
    }

    pub fn with(mut self, key: impl Into<ResourceKey>, relations: Vec<C>) -> Self {
        self.insert(key, relations);
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl<C: Clone + Send + Sync> ResourceAccessor<C> for InMemoryAccessor<C> {
    type Resource = Vec<C>;
    type Error = Infallible;

    fn fetch(&self, key: &ResourceKey) -> std::result::Result<Option<Vec<C>>, Infallible> {
        Ok(self.resources.get(key).cloned())
    }

    fn relation_fields_of(&self, resource: &Vec<C>) -> Vec<C> {
        resource.clone()
    }
}
