//! Typed field validators.
//!
//! Every validator accepts an arbitrary JSON value (the input may be
//! hostile or simply the wrong type) and returns a [`ValidationResult`]:
//! either a rejected, explained failure or a sanitized value safe to
//! persist. Validators never panic and never throw; all outcomes flow
//! through the returned structure.
//!
//! Optional fields (description, notes, bio, location, website, faction)
//! treat null, absent, and empty input as valid with a sanitized `null`;
//! they are validated only when non-empty.

use crate::domain::sanitize::{sanitize_multiline, sanitize_number, sanitize_string};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;
use url::Url;

/// Outcome of validating a single field.
///
/// Produced fresh on every call and never mutated after return. A result can
/// carry both errors and a sanitized value at once: numeric fields report
/// non-numeric input while still returning the safest usable value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the input passed every rule.
    pub is_valid: bool,
    /// All violated rules, in check order. Empty iff `is_valid`.
    pub errors: Vec<String>,
    /// The value safe to persist, when one could be derived.
    pub sanitized_value: Option<Value>,
}

impl ValidationResult {
    /// A passing result carrying the sanitized value.
    pub fn valid(value: Value) -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            sanitized_value: Some(value),
        }
    }

    /// A failing result with no usable value.
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            sanitized_value: None,
        }
    }

    /// A failing result that still carries the safest derivable value.
    pub fn invalid_with_value(errors: Vec<String>, value: Value) -> Self {
        Self {
            is_valid: false,
            errors,
            sanitized_value: Some(value),
        }
    }
}

const EMAIL_MAX_LEN: usize = 254;
const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 128;
const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 30;
const COLLECTION_NAME_MAX_LEN: usize = 100;
const COLLECTION_DESCRIPTION_MAX_LEN: usize = 500;
const ITEM_NAME_MAX_LEN: usize = 200;
const FACTION_MAX_LEN: usize = 100;
const NOTES_MAX_LEN: usize = 2000;
const BIO_MAX_LEN: usize = 500;
const LOCATION_MAX_LEN: usize = 100;
const WEBSITE_MAX_LEN: usize = 2048;
const COMMENT_MAX_LEN: usize = 1000;
const SEARCH_QUERY_MAX_LEN: usize = 200;

const QUANTITY_MIN: i64 = 0;
const QUANTITY_MAX: i64 = 9999;
const QUANTITY_DEFAULT: i64 = 1;

/// Accepted game systems; empty input falls back to `"other"`.
pub const GAME_SYSTEMS: &[&str] = &[
    "warhammer-40k",
    "age-of-sigmar",
    "kill-team",
    "necromunda",
    "horus-heresy",
    "other",
];

/// Accepted item statuses; empty input falls back to `"nib"` (new in box).
pub const ITEM_STATUSES: &[&str] = &["nib", "assembled", "primed", "painted", "based"];

// RFC 5322 derived; input is lower-cased before matching.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
    .expect("email pattern is valid")
});

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("username pattern is valid"));

// Strict v4 shape: version nibble 4, variant nibble 8-b. Anything else,
// including valid-looking UUIDs of other versions, is rejected.
static UUID_V4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
        .expect("uuid pattern is valid")
});

/// Validate an email address. Lower-cases and trims; over-length and bad
/// format are reported independently.
pub fn validate_email(input: &Value) -> ValidationResult {
    let email = sanitize_string(input).to_lowercase();
    if email.is_empty() {
        return ValidationResult::invalid(vec!["Email is required.".to_string()]);
    }

    let mut errors = Vec::new();
    if email.chars().count() > EMAIL_MAX_LEN {
        errors.push(format!(
            "Email must be at most {} characters.",
            EMAIL_MAX_LEN
        ));
    }
    if !EMAIL_RE.is_match(&email) {
        errors.push("Email address is not valid.".to_string());
    }

    if errors.is_empty() {
        ValidationResult::valid(json!(email))
    } else {
        ValidationResult::invalid(errors)
    }
}

/// Validate a password.
///
/// The raw value is preserved verbatim: whitespace and special characters
/// are significant, so this validator deliberately bypasses
/// [`sanitize_string`]. All violations are reported together.
pub fn validate_password(input: &Value) -> ValidationResult {
    let Some(password) = input.as_str() else {
        return ValidationResult::invalid(vec!["Password is required.".to_string()]);
    };
    if password.is_empty() {
        return ValidationResult::invalid(vec!["Password is required.".to_string()]);
    }

    let mut errors = Vec::new();
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        errors.push(format!(
            "Password must be at least {} characters.",
            PASSWORD_MIN_LEN
        ));
    }
    if len > PASSWORD_MAX_LEN {
        errors.push(format!(
            "Password must be at most {} characters.",
            PASSWORD_MAX_LEN
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        errors.push("Password must contain at least one letter.".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number.".to_string());
    }

    if errors.is_empty() {
        ValidationResult::valid(json!(password))
    } else {
        ValidationResult::invalid(errors)
    }
}

/// Validate a username: 3-30 characters from `[A-Za-z0-9_-]`.
pub fn validate_username(input: &Value) -> ValidationResult {
    let username = sanitize_string(input);
    if username.is_empty() {
        return ValidationResult::invalid(vec!["Username is required.".to_string()]);
    }

    let mut errors = Vec::new();
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        errors.push(format!(
            "Username must be at least {} characters.",
            USERNAME_MIN_LEN
        ));
    }
    if len > USERNAME_MAX_LEN {
        errors.push(format!(
            "Username must be at most {} characters.",
            USERNAME_MAX_LEN
        ));
    }
    if !USERNAME_RE.is_match(&username) {
        errors.push(
            "Username may only contain letters, numbers, underscores, and hyphens.".to_string(),
        );
    }

    if errors.is_empty() {
        ValidationResult::valid(json!(username))
    } else {
        ValidationResult::invalid(errors)
    }
}

/// Validate a record identifier: lower-cased, strict UUID v4 shape only.
pub fn validate_uuid(input: &Value) -> ValidationResult {
    let id = sanitize_string(input).to_lowercase();
    if id.is_empty() {
        return ValidationResult::invalid(vec!["Identifier is required.".to_string()]);
    }
    if UUID_V4_RE.is_match(&id) {
        ValidationResult::valid(json!(id))
    } else {
        ValidationResult::invalid(vec!["Identifier is not a valid UUID.".to_string()])
    }
}

/// Validate a collection name: required, at most 100 characters.
pub fn validate_collection_name(input: &Value) -> ValidationResult {
    let name = sanitize_string(input);
    if name.is_empty() {
        return ValidationResult::invalid(vec!["Collection name is required.".to_string()]);
    }
    if name.chars().count() > COLLECTION_NAME_MAX_LEN {
        return ValidationResult::invalid(vec![format!(
            "Collection name must be at most {} characters.",
            COLLECTION_NAME_MAX_LEN
        )]);
    }
    ValidationResult::valid(json!(name))
}

/// Validate a collection description: optional, multi-line, at most 500
/// characters.
pub fn validate_collection_description(input: &Value) -> ValidationResult {
    optional_multiline(input, COLLECTION_DESCRIPTION_MAX_LEN, "Description")
}

/// Validate an item name: required, at most 200 characters.
pub fn validate_item_name(input: &Value) -> ValidationResult {
    let name = sanitize_string(input);
    if name.is_empty() {
        return ValidationResult::invalid(vec!["Item name is required.".to_string()]);
    }
    if name.chars().count() > ITEM_NAME_MAX_LEN {
        return ValidationResult::invalid(vec![format!(
            "Item name must be at most {} characters.",
            ITEM_NAME_MAX_LEN
        )]);
    }
    ValidationResult::valid(json!(name))
}

/// Validate an item faction: optional, single-line, at most 100 characters.
pub fn validate_item_faction(input: &Value) -> ValidationResult {
    optional_single_line(input, FACTION_MAX_LEN, "Faction")
}

/// Validate item notes: optional, multi-line, at most 2000 characters.
pub fn validate_item_notes(input: &Value) -> ValidationResult {
    optional_multiline(input, NOTES_MAX_LEN, "Notes")
}

/// Validate an item quantity.
///
/// Out-of-range numbers clamp into `[0, 9999]` without an error. Non-numeric
/// non-empty input reports an error while still returning the field default,
/// so callers get both a message and the safest possible value. Empty input
/// takes the default quantity of 1.
pub fn validate_item_quantity(input: &Value) -> ValidationResult {
    if is_blank(input) {
        return ValidationResult::valid(json!(QUANTITY_DEFAULT));
    }
    match sanitize_number(input, QUANTITY_MIN, QUANTITY_MAX) {
        Some(n) => ValidationResult::valid(json!(n)),
        None => ValidationResult::invalid_with_value(
            vec!["Quantity must be a number.".to_string()],
            json!(QUANTITY_DEFAULT),
        ),
    }
}

/// Validate a game system: one of [`GAME_SYSTEMS`], defaulting to `"other"`.
pub fn validate_game_system(input: &Value) -> ValidationResult {
    enum_field(input, GAME_SYSTEMS, "other", "Game system")
}

/// Validate an item status: one of [`ITEM_STATUSES`], defaulting to `"nib"`.
pub fn validate_item_status(input: &Value) -> ValidationResult {
    enum_field(input, ITEM_STATUSES, "nib", "Status")
}

/// Validate a profile bio: optional, multi-line, at most 500 characters.
pub fn validate_bio(input: &Value) -> ValidationResult {
    optional_multiline(input, BIO_MAX_LEN, "Bio")
}

/// Validate a profile location: optional, single-line, at most 100
/// characters.
pub fn validate_location(input: &Value) -> ValidationResult {
    optional_single_line(input, LOCATION_MAX_LEN, "Location")
}

/// Validate a website URL.
///
/// Optional. A bare host is prefixed with `https://` before parsing; only
/// `http` and `https` schemes are accepted after parsing. The sanitized
/// value is the normalized URL string.
pub fn validate_website_url(input: &Value) -> ValidationResult {
    let raw = sanitize_string(input);
    if raw.is_empty() {
        return ValidationResult::valid(Value::Null);
    }
    if raw.chars().count() > WEBSITE_MAX_LEN {
        return ValidationResult::invalid(vec![format!(
            "Website must be at most {} characters.",
            WEBSITE_MAX_LEN
        )]);
    }

    let candidate = if raw.contains("://") {
        raw
    } else {
        format!("https://{}", raw)
    };

    match Url::parse(&candidate) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {
            ValidationResult::valid(json!(parsed.as_str()))
        }
        Ok(_) => {
            ValidationResult::invalid(vec!["Website must be an http or https URL.".to_string()])
        }
        Err(_) => ValidationResult::invalid(vec!["Website is not a valid URL.".to_string()]),
    }
}

/// Validate a comment body: required, multi-line, at most 1000 characters.
pub fn validate_comment(input: &Value) -> ValidationResult {
    let body = sanitize_multiline(input);
    if body.is_empty() {
        return ValidationResult::invalid(vec!["Comment cannot be empty.".to_string()]);
    }
    if body.chars().count() > COMMENT_MAX_LEN {
        return ValidationResult::invalid(vec![format!(
            "Comment must be at most {} characters.",
            COMMENT_MAX_LEN
        )]);
    }
    ValidationResult::valid(json!(body))
}

/// Validate a search query: may be empty, at most 200 characters.
pub fn validate_search_query(input: &Value) -> ValidationResult {
    let query = sanitize_string(input);
    if query.chars().count() > SEARCH_QUERY_MAX_LEN {
        return ValidationResult::invalid(vec![format!(
            "Search query must be at most {} characters.",
            SEARCH_QUERY_MAX_LEN
        )]);
    }
    ValidationResult::valid(json!(query))
}

/// Null, absent, or whitespace-only string.
fn is_blank(input: &Value) -> bool {
    match input {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn optional_single_line(input: &Value, max_len: usize, label: &str) -> ValidationResult {
    let value = sanitize_string(input);
    if value.is_empty() {
        return ValidationResult::valid(Value::Null);
    }
    if value.chars().count() > max_len {
        return ValidationResult::invalid(vec![format!(
            "{} must be at most {} characters.",
            label, max_len
        )]);
    }
    ValidationResult::valid(json!(value))
}

fn optional_multiline(input: &Value, max_len: usize, label: &str) -> ValidationResult {
    let value = sanitize_multiline(input);
    if value.is_empty() {
        return ValidationResult::valid(Value::Null);
    }
    if value.chars().count() > max_len {
        return ValidationResult::invalid(vec![format!(
            "{} must be at most {} characters.",
            label, max_len
        )]);
    }
    ValidationResult::valid(json!(value))
}

fn enum_field(
    input: &Value,
    accepted: &[&str],
    default: &str,
    label: &str,
) -> ValidationResult {
    let value = sanitize_string(input).to_lowercase();
    if value.is_empty() {
        return ValidationResult::valid(json!(default));
    }
    if accepted.contains(&value.as_str()) {
        ValidationResult::valid(json!(value))
    } else {
        ValidationResult::invalid(vec![format!(
            "{} must be one of: {}.",
            label,
            accepted.join(", ")
        )])
    }
}
