//! Generic collection endpoints
//!
//! Records are plain JSON objects keyed by a string `id`. The store enforces no
//! relationships between collections; clients cascade their own deletes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rand::Rng;
use serde_json::Value;

use crate::{error::AppError, state::AppState};

const ID_LEN: usize = 8;

fn ensure_collection(state: &AppState, collection: &str) -> Result<(), AppError> {
    if state.config.serves(collection) {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Unknown collection: {}", collection)))
    }
}

fn not_found(collection: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{}/{} not found", collection, id))
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Compare a top-level field against a query-string value. Strings must match
/// exactly; numbers and booleans compare through their JSON text.
fn field_matches(field: Option<&Value>, expected: &str) -> bool {
    match field {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

pub fn matches_filters(record: &Value, filters: &[(String, String)]) -> bool {
    filters
        .iter()
        .all(|(key, expected)| field_matches(record.get(key), expected))
}

/// GET /:collection?field=value
pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(filters): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Value>>, AppError> {
    ensure_collection(&state, &collection)?;

    let records: Vec<Value> = state
        .db
        .list_records(&collection)
        .await?
        .into_iter()
        .filter(|record| matches_filters(record, &filters))
        .collect();

    Ok(Json(records))
}

/// GET /:collection/:id
pub async fn get_one(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_collection(&state, &collection)?;

    let record = state
        .db
        .get_record(&collection, &id)
        .await?
        .ok_or_else(|| not_found(&collection, &id))?;

    Ok(Json(record))
}

/// POST /:collection
pub async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    ensure_collection(&state, &collection)?;

    let Value::Object(mut fields) = body else {
        return Err(AppError::BadRequest("Request body must be a JSON object".to_string()));
    };

    let id = match fields.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => generate_id(),
    };
    fields.insert("id".to_string(), Value::String(id.clone()));
    let record = Value::Object(fields);

    if !state.db.insert_record(&collection, &id, &record).await? {
        return Err(AppError::Conflict(format!("{}/{} already exists", collection, id)));
    }

    tracing::debug!("Created {}/{}", collection, id);
    Ok((StatusCode::CREATED, Json(record)))
}

/// PATCH /:collection/:id
pub async fn patch(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, AppError> {
    ensure_collection(&state, &collection)?;

    let Value::Object(changes) = body else {
        return Err(AppError::BadRequest("Request body must be a JSON object".to_string()));
    };

    let mut record = state
        .db
        .get_record(&collection, &id)
        .await?
        .ok_or_else(|| not_found(&collection, &id))?;

    let Value::Object(fields) = &mut record else {
        return Err(AppError::Internal(format!("{}/{} is not an object", collection, id)));
    };
    for (key, value) in changes {
        // ids are immutable
        if key != "id" {
            fields.insert(key, value);
        }
    }

    if !state.db.update_record(&collection, &id, &record).await? {
        return Err(not_found(&collection, &id));
    }

    tracing::debug!("Patched {}/{}", collection, id);
    Ok(Json(record))
}

/// DELETE /:collection/:id
pub async fn remove(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    ensure_collection(&state, &collection)?;

    let record = state
        .db
        .get_record(&collection, &id)
        .await?
        .ok_or_else(|| not_found(&collection, &id))?;

    if !state.db.delete_record(&collection, &id).await? {
        return Err(not_found(&collection, &id));
    }

    tracing::debug!("Deleted {}/{}", collection, id);
    Ok(Json(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filters(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn string_filters_are_exact_and_case_sensitive() {
        let record = json!({ "email": "alice@example.com" });
        assert!(matches_filters(&record, &filters(&[("email", "alice@example.com")])));
        assert!(!matches_filters(&record, &filters(&[("email", "Alice@example.com")])));
        assert!(!matches_filters(&record, &filters(&[("email", "alice")])));
    }

    #[test]
    fn scalar_filters_compare_json_text() {
        let record = json!({ "quantity": 2, "purchased": false, "notes": null });
        assert!(matches_filters(&record, &filters(&[("quantity", "2"), ("purchased", "false")])));
        assert!(!matches_filters(&record, &filters(&[("notes", "null")])));
        assert!(!matches_filters(&record, &filters(&[("missing", "x")])));
    }

    #[test]
    fn no_filters_match_everything() {
        assert!(matches_filters(&json!({ "id": "1" }), &[]));
    }

    #[test]
    fn generated_ids_are_short_lowercase_alphanumerics() {
        let id = generate_id();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }
}
