use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::{Collection, Field, FieldOptions, SchemaError};

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").unwrap());

/// Structural checks the store runs before persisting a collection.
pub fn validate_collection(collection: &Collection) -> Result<(), SchemaError> {
    let invalid = |reason: String| SchemaError::Validation {
        collection: collection.id.clone(),
        reason,
    };

    if collection.id.trim().is_empty() {
        return Err(invalid("collection id must not be empty".to_string()));
    }
    if !NAME_RE.is_match(&collection.name) {
        return Err(invalid(format!(
            "collection name `{}` must be non-empty and contain only letters, digits and underscores",
            collection.name
        )));
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    let mut primary_keys = 0;

    for field in &collection.fields {
        if field.id.trim().is_empty() {
            return Err(invalid(format!("field `{}` has an empty id", field.name)));
        }
        if !ids.insert(field.id.as_str()) {
            return Err(invalid(format!("duplicate field id `{}`", field.id)));
        }
        if !NAME_RE.is_match(&field.name) {
            return Err(invalid(format!(
                "field {} has invalid name `{}`",
                field.id, field.name
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(invalid(format!("duplicate field name `{}`", field.name)));
        }
        if field.primary_key {
            primary_keys += 1;
        }

        validate_options(field).map_err(|reason| {
            invalid(format!("field {} (`{}`): {}", field.id, field.name, reason))
        })?;
    }

    if primary_keys > 1 {
        return Err(invalid(format!(
            "expected at most one primary key field, found {}",
            primary_keys
        )));
    }

    Ok(())
}

fn validate_options(field: &Field) -> Result<(), String> {
    match &field.options {
        FieldOptions::Text(text) => {
            if text.max != 0 && text.min > text.max {
                return Err(format!("min length {} exceeds max {}", text.min, text.max));
            }
            for (key, pattern) in [
                ("pattern", &text.pattern),
                ("autogeneratePattern", &text.autogenerate_pattern),
            ] {
                if !pattern.is_empty() {
                    Regex::new(pattern).map_err(|e| format!("invalid {}: {}", key, e))?;
                }
            }
        }
        FieldOptions::Number(number) => {
            if let (Some(min), Some(max)) = (number.min, number.max) {
                if min > max {
                    return Err(format!("min {} exceeds max {}", min, max));
                }
            }
            if number.only_int {
                for bound in [number.min, number.max].into_iter().flatten() {
                    if bound.fract() != 0.0 {
                        return Err(format!("bound {} is not an integer", bound));
                    }
                }
            }
        }
        FieldOptions::Select(select) => {
            if select.values.is_empty() {
                return Err("select needs at least one value".to_string());
            }
            let unique: HashSet<_> = select.values.iter().collect();
            if unique.len() != select.values.len() {
                return Err("select values must be unique".to_string());
            }
            if select.max_select == 0 || select.max_select as usize > select.values.len() {
                return Err(format!(
                    "maxSelect must be between 1 and {}, got {}",
                    select.values.len(),
                    select.max_select
                ));
            }
        }
        FieldOptions::File(file) => {
            if file.max_select == 0 {
                return Err("maxSelect must be at least 1".to_string());
            }
        }
        FieldOptions::Relation(relation) => {
            if relation.collection_id.trim().is_empty() {
                return Err("relation needs a collectionId".to_string());
            }
            if relation.max_select > 0 && relation.min_select > relation.max_select {
                return Err(format!(
                    "minSelect {} exceeds maxSelect {}",
                    relation.min_select, relation.max_select
                ));
            }
        }
        FieldOptions::Bool | FieldOptions::Date(_) | FieldOptions::Autodate(_) => {}
    }

    Ok(())
}
