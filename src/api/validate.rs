//! Field validation shared by the request payloads.
//!
//! Validators trim their input and return the cleaned value, so handlers
//! only ever persist normalized text.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::{Error, Result};

pub const MAX_TEXT_LENGTH: usize = 255;
pub const MAX_URL_LENGTH: usize = 200;
pub const MAX_USERNAME_LENGTH: usize = 150;
const MAX_EMAIL_LENGTH: usize = 254;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid")
});

fn too_long(field: &str, max: usize) -> Error {
    Error::Validation(format!(
        "{}: Ensure this field has no more than {} characters.",
        field, max
    ))
}

/// Required, non-blank text of at most `max` characters.
pub fn required_text(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!(
            "{}: This field may not be blank.",
            field
        )));
    }
    if value.chars().count() > max {
        return Err(too_long(field, max));
    }
    Ok(value.to_string())
}

/// Optional free text. Blank collapses to `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// An absolute http(s) URL.
pub fn article_url(value: &str) -> Result<String> {
    let value = required_text("url", value, MAX_URL_LENGTH)?;

    let parsed = Url::parse(&value)
        .map_err(|_| Error::Validation("url: Enter a valid URL.".to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::Validation("url: Enter a valid URL.".to_string()));
    }

    Ok(value)
}

/// Letters, digits and `@.+-_` only.
pub fn username(value: &str) -> Result<String> {
    let value = required_text("username", value, MAX_USERNAME_LENGTH)?;
    if !USERNAME_RE.is_match(&value) {
        return Err(Error::Validation(
            "username: Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.".to_string(),
        ));
    }
    Ok(value)
}

/// Check a registration password pair.
pub fn password(password1: &str, password2: &str, min_length: usize) -> Result<()> {
    if password1 != password2 {
        return Err(Error::Validation(
            "password2: The two password fields didn't match.".to_string(),
        ));
    }
    if password1.chars().count() < min_length {
        return Err(Error::Validation(format!(
            "password1: This password is too short. It must contain at least {} characters.",
            min_length
        )));
    }
    if password1.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(
            "password1: This password is entirely numeric.".to_string(),
        ));
    }
    Ok(())
}

/// Optional email address. Blank collapses to `None`.
pub fn email(value: Option<String>) -> Result<Option<String>> {
    let Some(value) = optional_text(value) else {
        return Ok(None);
    };

    if value.len() > MAX_EMAIL_LENGTH {
        return Err(too_long("email", MAX_EMAIL_LENGTH));
    }

    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(Error::Validation(
            "email: Enter a valid email address.".to_string(),
        ));
    }

    Ok(Some(value))
}
