//! Request context and caller identity.

use std::collections::HashSet;
use std::fmt;

/// Identity of the party making a request.
///
/// The guard only needs to know whether the caller is authenticated.
/// Ownership checks additionally compare the caller against resource
/// relation values with `PartialEq`.
pub trait CallerIdentity: fmt::Debug + Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// A ready-made caller identity keyed by user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Caller {
    #[default]
    Anonymous,
    User(String),
}

impl Caller {
    pub fn user(id: impl Into<String>) -> Self {
        Self::User(id.into())
    }
}

impl CallerIdentity for Caller {
    fn is_authenticated(&self) -> bool {
        matches!(self, Caller::User(_))
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caller::Anonymous => write!(f, "anonymous"),
            Caller::User(id) => write!(f, "{id}"),
        }
    }
}

/// Opaque identifier of the resource a request addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ResourceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of an inbound request, as seen by rules.
///
/// Built fresh for every enforcement call and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RequestContext<C> {
    method: String,
    fields: HashSet<String>,
    caller: C,
    resource_key: Option<ResourceKey>,
}

impl<C: CallerIdentity> RequestContext<C> {
    pub fn builder(method: impl AsRef<str>, caller: C) -> RequestContextBuilder<C> {
        RequestContextBuilder {
            method: method.as_ref().to_ascii_uppercase(),
            fields: HashSet::new(),
            caller,
            resource_key: None,
        }
    }

    /// HTTP method, upper-cased.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn submitted_fields(&self) -> &HashSet<String> {
        &self.fields
    }

    pub fn caller(&self) -> &C {
        &self.caller
    }

    pub fn resource_key(&self) -> Option<&ResourceKey> {
        self.resource_key.as_ref()
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug)]
pub struct RequestContextBuilder<C> {
    method: String,
    fields: HashSet<String>,
    caller: C,
    resource_key: Option<ResourceKey>,
}

impl<C: CallerIdentity> RequestContextBuilder<C> {
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into());
        self
    }

    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn resource_key(mut self, key: impl Into<ResourceKey>) -> Self {
        self.resource_key = Some(key.into());
        self
    }

    pub fn build(self) -> RequestContext<C> {
        RequestContext {
            method: self.method,
            fields: self.fields,
            caller: self.caller,
            resource_key: self.resource_key,
        }
    }
}

/// Adapter the hosting framework implements for its request type.
pub trait InboundRequest<C: CallerIdentity> {
    fn method(&self) -> &str;

    /// Names of the fields submitted in the request body.
    fn field_names(&self) -> Vec<String>;

    fn caller(&self) -> C;

    /// Value of a route path parameter, if present.
    fn path_param(&self, name: &str) -> Option<String>;
}
