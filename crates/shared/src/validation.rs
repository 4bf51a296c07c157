//! Declarative form schemas shared by the client and its tests.
//!
//! A schema is a static list of fields, each with the rules it must satisfy. Validation
//! reports the first failing rule per field, in schema order.

use std::fmt;

use chrono::NaiveDate;

use crate::domain::EmployeeDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-empty after trimming whitespace.
    Required,
    /// Must be one of the server-provided positions; skipped when no catalog is known.
    OneOfCatalog,
    EmailShape,
    /// `YYYY-MM-DD` calendar date.
    IsoDate,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: &'static str,
    pub label: &'static str,
    pub rules: &'static [Rule],
}

pub const EMPLOYEE_FORM: &[FieldSpec] = &[
    FieldSpec {
        field: "firstName",
        label: "first name",
        rules: &[Rule::Required],
    },
    FieldSpec {
        field: "lastName",
        label: "last name",
        rules: &[Rule::Required],
    },
    FieldSpec {
        field: "position",
        label: "position",
        rules: &[Rule::Required, Rule::OneOfCatalog],
    },
    FieldSpec {
        field: "email",
        label: "email",
        rules: &[Rule::Required, Rule::EmailShape],
    },
    FieldSpec {
        field: "birthDate",
        label: "birth date",
        rules: &[Rule::Required, Rule::IsoDate],
    },
];

pub const CREDENTIALS_FORM: &[FieldSpec] = &[
    FieldSpec {
        field: "email",
        label: "email",
        rules: &[Rule::Required, Rule::EmailShape],
    },
    FieldSpec {
        field: "password",
        label: "password",
        rules: &[Rule::Required],
    },
];

/// Field lookup by wire name, so one validator serves every schema.
pub trait FormValues {
    fn value(&self, field: &str) -> Option<&str>;
}

impl FormValues for EmployeeDraft {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "firstName" => Some(&self.first_name),
            "lastName" => Some(&self.last_name),
            "position" => Some(&self.position),
            "email" => Some(&self.email),
            "birthDate" => Some(&self.birth_date),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CredentialsForm<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

impl FormValues for CredentialsForm<'_> {
    fn value(&self, field: &str) -> Option<&str> {
        match field {
            "email" => Some(self.email),
            "password" => Some(self.password),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|err| err.field == field)
            .map(|err| err.message.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", err.field, err.message)?;
        }
        Ok(())
    }
}

pub fn validate(schema: &[FieldSpec], form: &impl FormValues, catalog: &[String]) -> FieldErrors {
    let mut errors = Vec::new();
    for spec in schema {
        let value = form.value(spec.field).unwrap_or_default();
        if let Some(message) = first_failure(spec, value, catalog) {
            errors.push(FieldError {
                field: spec.field,
                message,
            });
        }
    }
    FieldErrors(errors)
}

pub fn validate_employee(draft: &EmployeeDraft, catalog: &[String]) -> FieldErrors {
    validate(EMPLOYEE_FORM, draft, catalog)
}

fn first_failure(spec: &FieldSpec, value: &str, catalog: &[String]) -> Option<String> {
    let trimmed = value.trim();
    for rule in spec.rules {
        let failed = match rule {
            Rule::Required => trimmed.is_empty(),
            // Empty optional values are left to `Required`.
            _ if trimmed.is_empty() => false,
            Rule::OneOfCatalog => !catalog.is_empty() && !catalog.iter().any(|p| p == trimmed),
            Rule::EmailShape => !looks_like_email(trimmed),
            Rule::IsoDate => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_err(),
        };
        if failed {
            return Some(rule_message(*rule, spec.label));
        }
    }
    None
}

fn rule_message(rule: Rule, label: &str) -> String {
    match rule {
        Rule::Required => format!("{label} is required"),
        Rule::OneOfCatalog => format!("{label} must be one of the available positions"),
        Rule::EmailShape => format!("{label} must look like name@domain"),
        Rule::IsoDate => format!("{label} must be a valid YYYY-MM-DD date"),
    }
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
