//! Field validation for tenant records and slugged resources.
//!
//! This is storage-side validation, reported as field-level messages and
//! kept apart from authorization: a request can be allowed and still fail
//! here, and nothing here looks at the actor. Uniqueness is the store's job.

use serde_json::{Map, Value};

use crate::errors::AccessError;
use crate::tenant::Tenant;

pub const SLUG_REQUIRED: &str = "Slug is required";
pub const SLUG_INVALID: &str = "Slug must only contain lowercase letters, numbers, and hyphens";

/// Field → messages accumulator.
#[derive(Debug, Default)]
pub struct FieldErrors {
    map: Map<String, Value>,
}

impl FieldErrors {
    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        let msg = Value::String(msg.into());
        match self.map.get_mut(field) {
            Some(Value::Array(arr)) => arr.push(msg),
            _ => {
                self.map.insert(field.to_string(), Value::Array(vec![msg]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn into_result(self, message: &str) -> Result<(), AccessError> {
        if self.map.is_empty() {
            return Ok(());
        }
        Err(AccessError::unprocessable(message).with_errors(Value::Object(self.map)))
    }
}

/// `[a-z0-9-]+`
pub fn validate_slug(value: Option<&str>) -> Result<(), &'static str> {
    let Some(slug) = value.filter(|s| !s.is_empty()) else {
        return Err(SLUG_REQUIRED);
    };
    if slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        Ok(())
    } else {
        Err(SLUG_INVALID)
    }
}

pub fn validate_tenant(tenant: &Tenant) -> Result<(), AccessError> {
    let mut errors = FieldErrors::default();

    if tenant.name.trim().is_empty() {
        errors.push_field("name", "Name is required");
    }
    if let Err(msg) = validate_slug(Some(&tenant.slug)) {
        errors.push_field("slug", msg);
    }

    errors.into_result("Tenant validation failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn slugs_are_lowercase_digits_and_hyphens() {
        assert!(validate_slug(Some("acme-corp-2")).is_ok());
        assert_eq!(validate_slug(Some("Acme")), Err(SLUG_INVALID));
        assert_eq!(validate_slug(Some("acme corp")), Err(SLUG_INVALID));
        assert_eq!(validate_slug(Some("")), Err(SLUG_REQUIRED));
        assert_eq!(validate_slug(None), Err(SLUG_REQUIRED));
    }

    #[test]
    fn tenant_errors_are_reported_per_field() {
        let err = validate_tenant(&Tenant::new("t1", " ", "Bad_Slug")).unwrap_err();

        assert_eq!(err.kind, ErrorKind::Unprocessable);
        let errors = err.errors.unwrap();
        assert_eq!(errors["name"][0], "Name is required");
        assert_eq!(errors["slug"][0], SLUG_INVALID);
    }

    #[test]
    fn valid_tenant_passes() {
        assert!(validate_tenant(&Tenant::new("t1", "Acme", "acme")).is_ok());
    }
}
