//! Whole-record validation against a declared schema.
//!
//! A [`Schema`] is the closed set of fields an entity update may touch. The
//! runner validates every declared field through its dedicated validator and
//! rejects fields the schema does not allow-list, which is this crate's
//! defense against mass assignment: an update payload can only ever write
//! fields the schema declares, and every accepted field passes through its
//! sanitizer before it is considered safe to use as a partial update.

use crate::domain::validate::{
    validate_bio, validate_collection_description, validate_collection_name, validate_comment,
    validate_email, validate_game_system, validate_item_faction, validate_item_name,
    validate_item_notes, validate_item_quantity, validate_item_status, validate_location,
    validate_password, validate_username, validate_website_url, ValidationResult,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Reserved error bucket for input fields the schema does not declare.
pub const UNEXPECTED_FIELDS: &str = "_unexpected";

/// Reserved error bucket for structural failures of the record itself.
pub const ROOT_ERRORS: &str = "_root";

/// Validator function for one field.
pub type FieldValidator = fn(&Value) -> ValidationResult;

/// One declared field: its validator and whether it must be present.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Validator invoked for present values.
    pub validate: FieldValidator,
    /// Whether an absent or empty value is an error.
    pub required: bool,
}

/// Closed allow-list of fields for one entity type.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<&'static str, FieldRule>,
}

impl Schema {
    /// Start building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            fields: BTreeMap::new(),
        }
    }

    /// The rule for a field, if declared.
    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields.get(name)
    }

    /// Whether the schema declares a field.
    pub fn declares(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate over declared field names.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder {
    fields: BTreeMap<&'static str, FieldRule>,
}

impl SchemaBuilder {
    /// Declare a required field.
    pub fn required(mut self, name: &'static str, validate: FieldValidator) -> Self {
        self.fields.insert(
            name,
            FieldRule {
                validate,
                required: true,
            },
        );
        self
    }

    /// Declare an optional field.
    pub fn optional(mut self, name: &'static str, validate: FieldValidator) -> Self {
        self.fields.insert(
            name,
            FieldRule {
                validate,
                required: false,
            },
        );
        self
    }

    /// Finish the schema.
    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

/// Outcome of validating a whole record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaOutcome {
    /// True iff no field, including the reserved buckets, produced errors.
    pub is_valid: bool,
    /// Errors keyed by field name, plus [`UNEXPECTED_FIELDS`]/[`ROOT_ERRORS`].
    pub errors: BTreeMap<String, Vec<String>>,
    /// Only the accepted, sanitized fields; safe as a partial update document.
    pub sanitized: Map<String, Value>,
}

/// Validate a record against a schema, rejecting undeclared fields.
pub fn validate_schema(data: &Value, schema: &Schema) -> SchemaOutcome {
    validate_schema_with(data, schema, true)
}

/// Validate a record against a schema.
///
/// With `reject_unexpected`, input keys absent from the schema are recorded
/// under the [`UNEXPECTED_FIELDS`] bucket; validation of the declared fields
/// continues regardless, so the caller sees every problem at once. Without
/// it, undeclared keys are silently ignored (they still never reach the
/// sanitized output).
pub fn validate_schema_with(data: &Value, schema: &Schema, reject_unexpected: bool) -> SchemaOutcome {
    let mut outcome = SchemaOutcome::default();

    let Some(object) = data.as_object() else {
        outcome.errors.insert(
            ROOT_ERRORS.to_string(),
            vec!["Expected an object.".to_string()],
        );
        return outcome;
    };

    if reject_unexpected {
        let unexpected: Vec<String> = object
            .keys()
            .filter(|key| !schema.declares(key))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            tracing::debug!(fields = ?unexpected, "rejected undeclared fields");
            outcome
                .errors
                .insert(UNEXPECTED_FIELDS.to_string(), unexpected);
        }
    }

    for (name, rule) in &schema.fields {
        match object.get(*name) {
            None => {
                if rule.required {
                    outcome
                        .errors
                        .insert(name.to_string(), vec![format!("{} is required.", name)]);
                }
                // Absent optional fields stay out of the partial update.
            }
            Some(value) => {
                if rule.required && is_empty_value(value) {
                    outcome
                        .errors
                        .insert(name.to_string(), vec![format!("{} is required.", name)]);
                    continue;
                }
                let result = (rule.validate)(value);
                if result.is_valid {
                    if let Some(sanitized) = result.sanitized_value {
                        outcome.sanitized.insert(name.to_string(), sanitized);
                    }
                } else {
                    outcome.errors.insert(name.to_string(), result.errors);
                }
            }
        }
    }

    outcome.is_valid = outcome.errors.is_empty();
    outcome
}

/// Null or whitespace-only: treated as absent for required-field checks.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Schema for account sign-up.
pub fn sign_up_schema() -> Schema {
    Schema::builder()
        .required("email", validate_email)
        .required("password", validate_password)
        .required("username", validate_username)
        .build()
}

/// Schema for sign-in credentials.
pub fn sign_in_schema() -> Schema {
    Schema::builder()
        .required("email", validate_email)
        .required("password", validate_password)
        .build()
}

/// Schema for creating or updating a collection.
pub fn collection_schema() -> Schema {
    Schema::builder()
        .required("name", validate_collection_name)
        .optional("description", validate_collection_description)
        .optional("game_system", validate_game_system)
        .build()
}

/// Schema for creating or updating an item.
pub fn item_schema() -> Schema {
    Schema::builder()
        .required("name", validate_item_name)
        .optional("faction", validate_item_faction)
        .optional("quantity", validate_item_quantity)
        .optional("game_system", validate_game_system)
        .optional("status", validate_item_status)
        .optional("notes", validate_item_notes)
        .build()
}

/// Schema for profile updates. Everything is optional; updates are partial.
pub fn profile_schema() -> Schema {
    Schema::builder()
        .optional("username", validate_username)
        .optional("bio", validate_bio)
        .optional("location", validate_location)
        .optional("website", validate_website_url)
        .build()
}

/// Schema for posting a comment.
pub fn comment_schema() -> Schema {
    Schema::builder().required("body", validate_comment).build()
}
