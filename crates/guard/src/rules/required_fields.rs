//! Require specific fields to be submitted with mutating requests.

use crate::{CallerIdentity, Error, Outcome, RequestContext, Result, Rule};
use std::collections::HashSet;
use tracing::debug;

/// Methods that carry a body by default.
pub const DEFAULT_MUTATING_METHODS: &[&str] = &["POST"];

/// Fails with `400 Bad Request` when a mutating request omits any of the
/// configured fields.
///
/// Requests whose method is not in the mutating set always pass. Missing
/// fields are reported in configuration order, so the message is stable
/// regardless of how the client ordered its submission.
#[derive(Debug, Clone)]
pub struct RequiredFields {
    fields: Vec<String>,
    methods: Vec<String>,
}

impl RequiredFields {
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if let Some(pos) = fields.iter().position(|f| f.trim().is_empty()) {
            return Err(Error::Config(format!(
                "required field at position {pos} is empty"
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = fields.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(Error::Config(format!(
                "required field '{dup}' is listed more than once"
            )));
        }
        Ok(Self {
            fields,
            methods: DEFAULT_MUTATING_METHODS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        })
    }

    /// Replace the set of methods the check applies to.
    pub fn with_methods<I, S>(mut self, methods: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let methods: Vec<String> = methods
            .into_iter()
            .map(|m| m.as_ref().trim().to_ascii_uppercase())
            .collect();
        if methods.iter().any(String::is_empty) {
            return Err(Error::Config("mutating method name is empty".into()));
        }
        self.methods = methods;
        Ok(self)
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    fn applies_to(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

impl<C: CallerIdentity> Rule<C> for RequiredFields {
    fn name(&self) -> &'static str {
        "required_fields"
    }

    fn evaluate(&self, ctx: &RequestContext<C>) -> Result<Outcome> {
        if !self.applies_to(ctx.method()) {
            return Ok(Outcome::Pass);
        }

        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| !ctx.has_field(field))
            .map(String::as_str)
            .collect();

        if missing.is_empty() {
            return Ok(Outcome::Pass);
        }

        debug!(missing = ?missing, "required fields absent");
        Ok(Outcome::bad_request(format!(
            "Missing keys {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Caller, StatusKind};

    fn post(fields: &[&str]) -> RequestContext<Caller> {
        RequestContext::builder("POST", Caller::Anonymous)
            .fields(fields.iter().copied())
            .build()
    }

    fn eval(rule: &RequiredFields, ctx: &RequestContext<Caller>) -> Outcome {
        Rule::<Caller>::evaluate(rule, ctx).unwrap()
    }

    #[test]
    fn test_all_fields_present_passes() {
        let rule = RequiredFields::new(["cat", "dog"]).unwrap();
        assert_eq!(eval(&rule, &post(&["dog", "cat"])), Outcome::Pass);
    }

    #[test]
    fn test_missing_field_reported() {
        let rule = RequiredFields::new(["cat", "mouse"]).unwrap();
        let outcome = eval(&rule, &post(&["dog", "cat"]));
        let detail = outcome.failure().unwrap();
        assert_eq!(detail.status, StatusKind::BadRequest);
        assert_eq!(detail.message, "Missing keys mouse");
    }

    #[test]
    fn test_missing_fields_follow_configured_order() {
        let rule = RequiredFields::new(["zebra", "ant", "mole"]).unwrap();
        let outcome = eval(&rule, &post(&["mole"]));
        assert_eq!(outcome.failure().unwrap().message, "Missing keys zebra, ant");
    }

    #[test]
    fn test_non_mutating_methods_pass() {
        let rule = RequiredFields::new(["cat"]).unwrap();
        for method in ["GET", "DELETE", "PUT", "HEAD"] {
            let ctx = RequestContext::builder(method, Caller::Anonymous).build();
            assert_eq!(eval(&rule, &ctx), Outcome::Pass, "{method}");
        }
    }

    #[test]
    fn test_configured_methods() {
        let rule = RequiredFields::new(["cat"])
            .unwrap()
            .with_methods(["post", "put"])
            .unwrap();
        let ctx = RequestContext::builder("PUT", Caller::Anonymous).build();
        assert_eq!(
            eval(&rule, &ctx).failure().unwrap().message,
            "Missing keys cat"
        );
    }

    #[test]
    fn test_invalid_field_names_rejected() {
        assert!(matches!(
            RequiredFields::new(["cat", " "]),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            RequiredFields::new(["cat", "dog", "cat"]),
            Err(Error::Config(_))
        ));
        assert!(RequiredFields::new(["cat"]).unwrap().with_methods([""]).is_err());
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let rule = RequiredFields::new(["cat", "mouse"]).unwrap();
        let ctx = post(&["cat"]);
        assert_eq!(eval(&rule, &ctx), eval(&rule, &ctx));
    }
}
