//! Route configuration loaded from TOML.

use crate::rules::{
    DEFAULT_MUTATING_METHODS, InMemoryAccessor, RequiredFields, ResourceAccessor, ResourceOwnership,
};
use crate::{Caller, CallerIdentity, Enforcer, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Route table: which rules guard which route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Methods on which required fields are enforced.
    #[serde(default = "default_mutating_methods")]
    pub mutating_methods: Vec<String>,

    /// Routes keyed by name.
    #[serde(default)]
    pub routes: BTreeMap<String, RouteConfig>,

    /// Resource fixtures for dry runs, keyed by resource key.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceFixture>,
}

/// Rules for a single route.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Fields that mutating requests must submit.
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Require the caller to be related to the addressed resource.
    #[serde(default)]
    pub owner: bool,

    /// Path parameter carrying the resource key.
    pub resource_param: Option<String>,
}

/// Relation values of a fixture resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFixture {
    #[serde(default)]
    pub relations: Vec<String>,
}

fn default_mutating_methods() -> Vec<String> {
    DEFAULT_MUTATING_METHODS.iter().map(|m| m.to_string()).collect()
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            mutating_methods: default_mutating_methods(),
            routes: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }
}

impl GuardConfig {
    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse and validate a configuration string.
    pub fn parse(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could only fail at request time.
    pub fn validate(&self) -> Result<()> {
        if self.mutating_methods.iter().any(|m| m.trim().is_empty()) {
            return Err(Error::Config("mutating method name is empty".into()));
        }

        for (name, route) in &self.routes {
            if route.required_fields.is_empty() && !route.owner {
                return Err(Error::Config(format!("route '{name}' has no rules")));
            }

            let mut seen = HashSet::new();
            for field in &route.required_fields {
                if field.trim().is_empty() {
                    return Err(Error::Config(format!(
                        "route '{name}' lists an empty field name"
                    )));
                }
                if !seen.insert(field.as_str()) {
                    return Err(Error::Config(format!(
                        "route '{name}' lists field '{field}' more than once"
                    )));
                }
            }

            match (&route.resource_param, route.owner) {
                (None, true) => {
                    return Err(Error::Config(format!(
                        "route '{name}' sets owner but no resource_param"
                    )));
                }
                (Some(_), false) => {
                    return Err(Error::Config(format!(
                        "route '{name}' sets resource_param without owner"
                    )));
                }
                (Some(param), true) if param.trim().is_empty() => {
                    return Err(Error::Config(format!(
                        "route '{name}' has an empty resource_param"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn route(&self, name: &str) -> Option<&RouteConfig> {
        self.routes.get(name)
    }

    /// Build the enforcer for a route.
    ///
    /// Field checks run before the ownership check. Routes that check
    /// ownership need an accessor.
    pub fn enforcer<C, A>(&self, name: &str, accessor: Option<A>) -> Result<Enforcer<C>>
    where
        C: CallerIdentity + PartialEq + 'static,
        A: ResourceAccessor<C> + 'static,
    {
        let route = self
            .route(name)
            .ok_or_else(|| Error::Config(format!("unknown route '{name}'")))?;

        let mut builder = Enforcer::builder(name);
        if !route.required_fields.is_empty() {
            let fields = RequiredFields::new(route.required_fields.iter().cloned())?
                .with_methods(&self.mutating_methods)?;
            builder = builder.rule(fields);
        }
        if route.owner {
            let accessor = accessor.ok_or_else(|| {
                Error::Config(format!("route '{name}' checks ownership but has no accessor"))
            })?;
            builder = builder.rule(ResourceOwnership::new(accessor));
        }
        if let Some(param) = &route.resource_param {
            builder = builder.resource_param(param.clone());
        }
        builder.build()
    }

    /// Accessor serving the configured resource fixtures.
    pub fn fixtures(&self) -> InMemoryAccessor<Caller> {
        self.resources
            .iter()
            .fold(InMemoryAccessor::new(), |acc, (key, fixture)| {
                acc.with(
                    key.as_str(),
                    fixture.relations.iter().map(Caller::user).collect(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[routes.create_pet]
required_fields = ["cat", "dog"]

[routes.update_pet]
required_fields = ["name"]
owner = true
resource_param = "pk"

[resources."1"]
relations = ["alice"]
"#;

    #[test]
    fn test_parse_toml() {
        let config = GuardConfig::parse(SAMPLE).unwrap();
        assert_eq!(config.mutating_methods, vec!["POST"]);
        assert_eq!(config.routes.len(), 2);
        assert!(config.route("update_pet").unwrap().owner);
        assert_eq!(config.fixtures().len(), 1);
    }

    #[test]
    fn test_builds_rules_in_order() {
        let config = GuardConfig::parse(SAMPLE).unwrap();
        let enforcer = config
            .enforcer::<Caller, _>("update_pet", Some(config.fixtures()))
            .unwrap();
        assert_eq!(
            enforcer.rule_names(),
            vec!["required_fields", "resource_ownership"]
        );
        assert_eq!(enforcer.resource_param(), Some("pk"));
    }

    #[test]
    fn test_owner_route_needs_accessor() {
        let config = GuardConfig::parse(SAMPLE).unwrap();
        let result = config.enforcer::<Caller, InMemoryAccessor<Caller>>("update_pet", None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_unknown_route() {
        let config = GuardConfig::parse(SAMPLE).unwrap();
        let result = config.enforcer::<Caller, InMemoryAccessor<Caller>>("missing", None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_owner_without_param_rejected() {
        let toml = r#"
[routes.update_pet]
owner = true
"#;
        assert!(matches!(GuardConfig::parse(toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let toml = r#"
[routes.create_pet]
required_fields = ["cat", "cat"]
"#;
        assert!(matches!(GuardConfig::parse(toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_route_without_rules_rejected() {
        let toml = "[routes.noop]\n";
        assert!(matches!(GuardConfig::parse(toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_configured_methods_reach_enforcement() {
        use crate::{InboundRequest, Outcome};

        struct Put(&'static str);

        impl InboundRequest<Caller> for Put {
            fn method(&self) -> &str {
                self.0
            }

            fn field_names(&self) -> Vec<String> {
                Vec::new()
            }

            fn caller(&self) -> Caller {
                Caller::Anonymous
            }

            fn path_param(&self, _name: &str) -> Option<String> {
                None
            }
        }

        let toml = r#"
mutating_methods = ["put"]

[routes.replace_pet]
required_fields = ["cat"]
"#;
        let config = GuardConfig::parse(toml).unwrap();
        let enforcer = config
            .enforcer::<Caller, InMemoryAccessor<Caller>>("replace_pet", None)
            .unwrap();

        let outcome = enforcer.check(&Put("PUT")).unwrap();
        assert_eq!(outcome.failure().unwrap().message, "Missing keys cat");
        assert_eq!(enforcer.check(&Put("POST")).unwrap(), Outcome::Pass);
    }

    #[test]
    fn test_param_without_owner_rejected() {
        let toml = r#"
[routes.create_pet]
required_fields = ["cat"]
resource_param = "pk"
"#;
        assert!(matches!(GuardConfig::parse(toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_names_rejected() {
        let empty_field = r#"
[routes.create_pet]
required_fields = ["cat", ""]
"#;
        assert!(matches!(GuardConfig::parse(empty_field), Err(Error::Config(_))));

        let empty_method = r#"
mutating_methods = ["POST", " "]

[routes.create_pet]
required_fields = ["cat"]
"#;
        assert!(matches!(GuardConfig::parse(empty_method), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            GuardConfig::parse("routes = 3"),
            Err(Error::Parse(_))
        ));
    }
}
