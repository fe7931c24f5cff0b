//! Request guards for API handlers.
//!
//! A guard checks declared preconditions before a handler runs and answers
//! with exactly one of two outcomes: the request passes and the handler
//! runs untouched, or it fails with a single structured rejection.
//!
//! # Core Concepts
//!
//! - [`RequestContext`]: read-only view of a request (method, submitted
//!   fields, caller, addressed resource).
//! - [`Rule`]: a single stateless precondition producing an [`Outcome`].
//! - [`RuleSet`]: an ordered composition of rules that stops at the first
//!   failure.
//! - [`Enforcer`]: evaluates a route's rules and either calls the handler
//!   or returns a [`Rejection`].
//!
//! Two rules ship with the crate: [`RequiredFields`] and
//! [`ResourceOwnership`], plus [`OwnershipWithFields`] which composes them.
//!
//! # Example
//!
//! ```
//! use guard::{Caller, InMemoryAccessor, Outcome, RequestContext, RequiredFields, Rule};
//!
//! let accessor = InMemoryAccessor::new().with("1", vec![Caller::user("alice")]);
//! let rules = guard::OwnershipWithFields::new(RequiredFields::new(["title"])?, accessor);
//!
//! let ctx = RequestContext::builder("POST", Caller::user("alice"))
//!     .field("title")
//!     .resource_key("1")
//!     .build();
//! assert_eq!(rules.evaluate(&ctx)?, Outcome::Pass);
//! # Ok::<(), guard::Error>(())
//! ```

mod config;
mod context;
mod enforcer;
mod error;
mod outcome;
mod rule;
pub mod rules;

pub use config::{GuardConfig, ResourceFixture, RouteConfig};
pub use context::{
    Caller, CallerIdentity, InboundRequest, RequestContext, RequestContextBuilder, ResourceKey,
};
pub use enforcer::{Enforcer, EnforcerBuilder};
pub use error::{Error, Result};
pub use outcome::{FailureDetail, Outcome, Rejection, RejectionBody, StatusKind};
pub use rule::{Rule, RuleSet};
pub use rules::{
    InMemoryAccessor, OwnershipWithFields, RequiredFields, ResourceAccessor, ResourceOwnership,
};
