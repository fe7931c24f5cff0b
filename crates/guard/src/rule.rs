//! The rule contract and ordered rule composition.

use crate::{CallerIdentity, Outcome, RequestContext, Result};
use std::sync::Arc;
use tracing::debug;

/// A single precondition check.
///
/// Rules are stateless: `evaluate` must not mutate anything and must give
/// the same outcome for the same context. They are built once when a route
/// is registered and shared across concurrent requests.
///
/// Request failures are reported as [`Outcome::Fail`]. The `Err` channel is
/// reserved for faults that are not the caller's doing, such as a resource
/// store that cannot be reached.
pub trait Rule<C: CallerIdentity>: Send + Sync {
    /// Short name used in logs and route listings.
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &RequestContext<C>) -> Result<Outcome>;

    /// Whether this rule needs the request to address a resource.
    fn requires_resource_key(&self) -> bool {
        false
    }
}

/// An ordered, short-circuiting composition of rules.
///
/// Members run in declaration order; the first failure is returned and
/// later members are not evaluated. Failures are never aggregated.
pub struct RuleSet<C: CallerIdentity> {
    name: &'static str,
    rules: Vec<Arc<dyn Rule<C>>>,
}

impl<C: CallerIdentity> RuleSet<C> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            rules: Vec::new(),
        }
    }

    /// Append a rule to the end of the evaluation order.
    pub fn with(mut self, rule: impl Rule<C> + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Append a rule that is shared with other rule sets.
    pub fn with_shared(mut self, rule: Arc<dyn Rule<C>>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Names of the member rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}

impl<C: CallerIdentity> Rule<C> for RuleSet<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn evaluate(&self, ctx: &RequestContext<C>) -> Result<Outcome> {
        for rule in &self.rules {
            let outcome = rule.evaluate(ctx)?;
            if let Outcome::Fail(detail) = &outcome {
                debug!(set = self.name, rule = rule.name(), status = %detail.status, "rule failed");
                return Ok(outcome);
            }
        }
        Ok(Outcome::Pass)
    }

    fn requires_resource_key(&self) -> bool {
        self.rules.iter().any(|rule| rule.requires_resource_key())
    }
}
