//! Route-level enforcement around a handler.

use crate::rules::{OwnershipWithFields, RequiredFields, ResourceAccessor, ResourceOwnership};
use crate::{
    CallerIdentity, Error, InboundRequest, Outcome, Rejection, RequestContext, Result, Rule,
    RuleSet,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Evaluates a route's rules before its handler runs.
///
/// Built once when the route is registered. On failure the handler is not
/// invoked and a [`Rejection`] is returned in its place; on success the
/// handler's result is returned untouched.
pub struct Enforcer<C: CallerIdentity> {
    route: String,
    rules: RuleSet<C>,
    resource_param: Option<String>,
}

impl<C: CallerIdentity + 'static> Enforcer<C> {
    pub fn builder(route: impl Into<String>) -> EnforcerBuilder<C> {
        EnforcerBuilder {
            route: route.into(),
            rules: RuleSet::new("route"),
            resource_param: None,
        }
    }

    /// Require fields on mutating requests.
    pub fn require_fields(route: impl Into<String>, fields: RequiredFields) -> Result<Self> {
        Self::builder(route).rule(fields).build()
    }

    /// Require the caller to be related to the resource named by `resource_param`.
    pub fn require_owner<A>(
        route: impl Into<String>,
        accessor: A,
        resource_param: impl Into<String>,
    ) -> Result<Self>
    where
        C: PartialEq,
        A: ResourceAccessor<C> + 'static,
    {
        Self::builder(route)
            .rule(ResourceOwnership::new(accessor))
            .resource_param(resource_param)
            .build()
    }

    /// Require fields, then ownership.
    pub fn require_owner_with_fields<A>(
        route: impl Into<String>,
        fields: RequiredFields,
        accessor: A,
        resource_param: impl Into<String>,
    ) -> Result<Self>
    where
        C: PartialEq,
        A: ResourceAccessor<C> + 'static,
    {
        Self::builder(route)
            .rule(OwnershipWithFields::new(fields, accessor))
            .resource_param(resource_param)
            .build()
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn resource_param(&self) -> Option<&str> {
        self.resource_param.as_deref()
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.rule_names()
    }

    /// Derive the request context the rules see.
    pub fn context<R: InboundRequest<C>>(&self, req: &R) -> Result<RequestContext<C>> {
        let mut builder =
            RequestContext::builder(req.method(), req.caller()).fields(req.field_names());

        if let Some(param) = &self.resource_param {
            let key = req
                .path_param(param)
                .ok_or_else(|| Error::MissingResourceParam {
                    param: param.clone(),
                })?;
            builder = builder.resource_key(key);
        }

        Ok(builder.build())
    }

    /// Evaluate the route's rules against a request.
    pub fn check<R: InboundRequest<C>>(&self, req: &R) -> Result<Outcome> {
        let _span = debug_span!("enforce", route = %self.route).entered();
        let ctx = self.context(req)?;
        let outcome = self.rules.evaluate(&ctx)?;
        debug!(passed = outcome.is_pass(), "rules evaluated");
        Ok(outcome)
    }

    /// Run `handler` only if the request satisfies the route's rules.
    pub fn intercept<R, F, T>(&self, req: &R, handler: F) -> Result<T>
    where
        R: InboundRequest<C>,
        F: FnOnce() -> T,
        T: From<Rejection>,
    {
        match self.check(req)? {
            Outcome::Pass => Ok(handler()),
            Outcome::Fail(detail) => Ok(T::from(Rejection::from(detail))),
        }
    }

    /// Like [`intercept`](Self::intercept) for handlers returning a future.
    ///
    /// Rules are evaluated before the handler's future is created.
    pub async fn intercept_async<R, F, Fut, T>(&self, req: &R, handler: F) -> Result<T>
    where
        R: InboundRequest<C>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
        T: From<Rejection>,
    {
        match self.check(req)? {
            Outcome::Pass => Ok(handler().await),
            Outcome::Fail(detail) => Ok(T::from(Rejection::from(detail))),
        }
    }

    /// Wrap a handler so every call goes through this enforcer.
    pub fn wrap<R, F, T>(self: Arc<Self>, handler: F) -> impl Fn(&R) -> Result<T> + Send + Sync
    where
        R: InboundRequest<C>,
        F: Fn(&R) -> T + Send + Sync,
        T: From<Rejection>,
    {
        move |req: &R| self.intercept(req, || handler(req))
    }
}

/// Builder for [`Enforcer`].
pub struct EnforcerBuilder<C: CallerIdentity> {
    route: String,
    rules: RuleSet<C>,
    resource_param: Option<String>,
}

impl<C: CallerIdentity + 'static> EnforcerBuilder<C> {
    /// Append a rule; rules run in the order they are added.
    pub fn rule(mut self, rule: impl Rule<C> + 'static) -> Self {
        self.rules = self.rules.with(rule);
        self
    }

    pub fn shared_rule(mut self, rule: Arc<dyn Rule<C>>) -> Self {
        self.rules = self.rules.with_shared(rule);
        self
    }

    /// Path parameter that carries the resource key.
    pub fn resource_param(mut self, param: impl Into<String>) -> Self {
        self.resource_param = Some(param.into());
        self
    }

    pub fn build(self) -> Result<Enforcer<C>> {
        if self.rules.is_empty() {
            return Err(Error::Config(format!(
                "route '{}' has no rules",
                self.route
            )));
        }
        match &self.resource_param {
            Some(param) if param.trim().is_empty() => {
                return Err(Error::Config(format!(
                    "route '{}' has an empty resource parameter",
                    self.route
                )));
            }
            Some(_) if !self.rules.requires_resource_key() => {
                return Err(Error::Config(format!(
                    "route '{}' declares a resource parameter but no rule addresses a resource",
                    self.route
                )));
            }
            None if self.rules.requires_resource_key() => {
                return Err(Error::Config(format!(
                    "route '{}' checks resource ownership but declares no resource parameter",
                    self.route
                )));
            }
            _ => {}
        }

        Ok(Enforcer {
            route: self.route,
            rules: self.rules,
            resource_param: self.resource_param,
        })
    }
}
