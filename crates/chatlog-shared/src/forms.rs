//! Validation for the personal-details form.
//!
//! Fields arrive as raw strings, the way a browser form submits them. Presence
//! is checked first and the first failing rule is reported.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_AGE, TELEPHONE_DIGITS};
use crate::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub telephone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

/// A form that passed validation, with whitespace trimmed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSubmission {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub country: String,
    pub address: String,
    pub telephone: String,
    pub email: String,
    /// Selected technologies, joined with `", "`.
    pub tech_stack: String,
}

impl UserForm {
    pub fn validate(&self) -> Result<UserSubmission, ValidationError> {
        let name = required("name", &self.name)?;
        let age = required("age", &self.age)?;
        let gender = required("gender", &self.gender)?;
        let country = required("country", &self.country)?;
        let address = required("address", &self.address)?;
        let telephone = required("telephone", &self.telephone)?;
        let email = required("email", &self.email)?;

        let tech: Vec<&str> = self
            .tech_stack
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if tech.is_empty() {
            return Err(ValidationError::MissingTechStack);
        }

        let age = parse_age(age)?;
        validate_telephone(telephone)?;
        validate_email(email)?;

        Ok(UserSubmission {
            name: name.to_string(),
            age,
            gender: gender.to_string(),
            country: country.to_string(),
            address: address.to_string(),
            telephone: telephone.to_string(),
            email: email.to_string(),
            tech_stack: tech.join(", "),
        })
    }
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed)
}

pub fn parse_age(raw: &str) -> Result<u32, ValidationError> {
    let age: u32 = raw.trim().parse().map_err(|_| ValidationError::InvalidAge)?;
    if age == 0 || age > MAX_AGE {
        return Err(ValidationError::InvalidAge);
    }
    Ok(age)
}

pub fn validate_telephone(raw: &str) -> Result<(), ValidationError> {
    if raw.len() != TELEPHONE_DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidTelephone);
    }
    Ok(())
}

pub fn validate_email(raw: &str) -> Result<(), ValidationError> {
    match raw.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !raw.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}
