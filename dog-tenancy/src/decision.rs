//! Decisions and the query filters they carry.
//!
//! A decision is either unconditional (`Allow` / `Deny`) or a filter the
//! storage layer must AND onto the query. Reads treat `Deny` exactly like
//! "no matching rows", so a caller cannot tell a forbidden record from a
//! missing one.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AccessError;

/// Field a filter constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterField {
    Tenant,
    Id,
}

impl FilterField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterField::Tenant => "tenant",
            FilterField::Id => "id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    Equals(String),
    In(Vec<String>),
}

/// A single equality constraint on `tenant` or `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: FilterField,
    pub constraint: Constraint,
}

impl Filter {
    pub fn equals(field: FilterField, value: impl Into<String>) -> Self {
        Self {
            field,
            constraint: Constraint::Equals(value.into()),
        }
    }

    pub fn one_of<I, S>(field: FilterField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field,
            constraint: Constraint::In(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Storage `where` shape: `{"tenant": {"equals": "t1"}}`.
    pub fn to_where(&self) -> Value {
        let constraint = match &self.constraint {
            Constraint::Equals(v) => json!({ "equals": v }),
            Constraint::In(vs) => json!({ "in": vs }),
        };
        let mut out = serde_json::Map::new();
        out.insert(self.field.as_str().to_string(), constraint);
        Value::Object(out)
    }

    /// Evaluate against a JSON record.
    ///
    /// The field may hold a bare id (string or number) or an expanded
    /// relationship object; a missing field never matches.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(actual) = record
            .get(self.field.as_str())
            .and_then(crate::tenant::tenant_id_from_value)
        else {
            return false;
        };

        match &self.constraint {
            Constraint::Equals(v) => actual.as_str() == v,
            Constraint::In(vs) => vs.iter().any(|v| actual.as_str() == v),
        }
    }
}

/// Engine output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "filter", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
    FilterBy(Filter),
}

/// How a read should be scoped after applying a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryScope {
    Unrestricted,
    Filtered(Filter),
    /// Return no rows; never an error.
    Nothing,
}

impl Decision {
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, Decision::Deny)
    }

    pub fn filter(&self) -> Option<&Filter> {
        match self {
            Decision::FilterBy(f) => Some(f),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Decision::Allow => "allow",
            Decision::Deny => "deny",
            Decision::FilterBy(_) => "filter",
        }
    }

    /// Read semantics: `Deny` becomes an empty result set.
    pub fn scope(self) -> QueryScope {
        match self {
            Decision::Allow => QueryScope::Unrestricted,
            Decision::Deny => QueryScope::Nothing,
            Decision::FilterBy(f) => QueryScope::Filtered(f),
        }
    }

    /// Write semantics: `Deny` becomes a generic access failure.
    ///
    /// Returns the filter to AND onto the write's target query, if any. An
    /// authenticated caller gets `Forbidden`, a missing actor
    /// `NotAuthenticated`; neither message names the target.
    pub fn enforce(self, authenticated: bool) -> Result<Option<Filter>, AccessError> {
        match self {
            Decision::Allow => Ok(None),
            Decision::FilterBy(f) => Ok(Some(f)),
            Decision::Deny if !authenticated => Err(AccessError::not_authenticated("Not authenticated")),
            Decision::Deny => Err(AccessError::forbidden(
                "You are not allowed to perform this operation",
            )),
        }
    }

    /// Would this decision let the caller touch `record`?
    pub fn permits(&self, record: &Value) -> bool {
        match self {
            Decision::Allow => true,
            Decision::Deny => false,
            Decision::FilterBy(f) => f.matches(record),
        }
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        Decision::from_bool(allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn filters_render_as_where_objects() {
        let eq = Filter::equals(FilterField::Tenant, "t1");
        let within = Filter::one_of(FilterField::Id, ["t1", "t2"]);

        assert_eq!(eq.to_where(), json!({"tenant": {"equals": "t1"}}));
        assert_eq!(within.to_where(), json!({"id": {"in": ["t1", "t2"]}}));
    }

    #[test]
    fn filters_match_bare_numeric_and_expanded_fields() {
        let f = Filter::equals(FilterField::Tenant, "7");

        assert!(f.matches(&json!({"tenant": 7})));
        assert!(f.matches(&json!({"tenant": {"id": "7", "name": "Seven"}})));
        assert!(!f.matches(&json!({"tenant": "8"})));
        assert!(!f.matches(&json!({"title": "orphan"})));
    }

    #[test]
    fn empty_in_matches_nothing() {
        let f = Filter::one_of(FilterField::Id, Vec::<String>::new());
        assert!(!f.matches(&json!({"id": "t1"})));
    }

    #[test]
    fn deny_reads_as_empty_and_writes_as_forbidden() {
        assert_eq!(Decision::Deny.scope(), QueryScope::Nothing);

        let err = Decision::Deny.enforce(true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let err = Decision::Deny.enforce(false).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotAuthenticated);
    }

    #[test]
    fn serializes_with_a_decision_tag() {
        let d = Decision::FilterBy(Filter::equals(FilterField::Tenant, "t1"));
        let v = serde_json::to_value(&d).unwrap();

        assert_eq!(v["decision"], "filter_by");
        assert_eq!(v["filter"]["field"], "tenant");
        assert_eq!(serde_json::to_value(Decision::Allow).unwrap(), json!({"decision": "allow"}));
    }
}
