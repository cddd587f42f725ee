use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::Method;
use axum::response::Json;
use nts_store::Storage;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::note::{Envelope, Note, PureNote};

/// Shared handler state: the one store this deployment runs on.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Storage<PureNote>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage<PureNote>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn Storage<PureNote> {
        self.store.as_ref()
    }
}

type ApiResult = Result<Envelope, ApiError>;

fn require_method(got: &Method, need: Method) -> Result<(), ApiError> {
    if *got == need {
        Ok(())
    } else {
        Err(ApiError::WrongMethod {
            got: got.clone(),
            need,
        })
    }
}

fn parse_note(body: &[u8]) -> Result<Note, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::Internal(format!("cannot encode response: {e}")))
}

/// Turn a handler outcome into the envelope sent back, logging failures.
fn respond(op: &str, result: ApiResult) -> Envelope {
    result.unwrap_or_else(|err| {
        err.log(op);
        Envelope::error(err.to_string())
    })
}

/// `POST /create` with `{name, last_name, note}`; replies `{"id": N}`.
pub async fn create_note(State(state): State<AppState>, method: Method, body: Bytes) -> Envelope {
    respond("create", create(&state, &method, &body))
}

fn create(state: &AppState, method: &Method, body: &[u8]) -> ApiResult {
    require_method(method, Method::POST)?;
    let note = parse_note(body)?;
    if note.is_incomplete() {
        debug!(
            name = %note.name,
            last_name = %note.last_name,
            note = %note.content,
            "incomplete note"
        );
        return Err(ApiError::MissingData);
    }

    let id = state
        .store()
        .add(PureNote::from(note))
        .map_err(ApiError::AddRejected)?;
    info!(id, "OK - create");
    Ok(Envelope::ok(json!({ "id": id })))
}

/// `POST /get` with `{id}`; replies with the note.
pub async fn get_note(State(state): State<AppState>, method: Method, body: Bytes) -> Envelope {
    respond("get", get(&state, &method, &body))
}

fn get(state: &AppState, method: &Method, body: &[u8]) -> ApiResult {
    require_method(method, Method::POST)?;
    let request = parse_note(body)?;
    if request.id < 1 {
        return Err(ApiError::InvalidId(request.id));
    }

    let note = state
        .store()
        .get_by_id(request.id)
        .ok_or(ApiError::NoteNotFound(request.id))?
        .into_note(request.id);
    let data = to_json(&note)?;
    info!(id = request.id, "OK - get");
    Ok(Envelope::ok(data))
}

/// `POST /update` with `{id, name, last_name, note}`.
pub async fn update_note(State(state): State<AppState>, method: Method, body: Bytes) -> Envelope {
    respond("update", update(&state, &method, &body))
}

fn update(state: &AppState, method: &Method, body: &[u8]) -> ApiResult {
    require_method(method, Method::POST)?;
    let note = parse_note(body)?;
    if note.is_incomplete() || note.id < 1 {
        debug!(id = note.id, name = %note.name, last_name = %note.last_name, "incomplete update");
        return Err(ApiError::MissingData);
    }

    let id = note.id;
    let updated = state
        .store()
        .update_by_id(id, PureNote::from(note))
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !updated {
        return Err(ApiError::UpdateMissing(id));
    }
    info!(id, "OK - update");
    Ok(Envelope::empty())
}

/// `POST /delete` with `{id}`.
pub async fn delete_note(State(state): State<AppState>, method: Method, body: Bytes) -> Envelope {
    respond("delete", delete(&state, &method, &body))
}

fn delete(state: &AppState, method: &Method, body: &[u8]) -> ApiResult {
    require_method(method, Method::POST)?;
    let request = parse_note(body)?;
    if request.id < 1 {
        return Err(ApiError::InvalidId(request.id));
    }

    if !state.store().remove_by_id(request.id) {
        return Err(ApiError::DeleteMissing(request.id));
    }
    info!(id = request.id, "OK - delete");
    Ok(Envelope::empty())
}

/// `GET /get-all`; replies with every note, ordered by id. The body is
/// ignored.
pub async fn get_all_notes(State(state): State<AppState>, method: Method) -> Envelope {
    respond("get-all", get_all(&state, &method))
}

fn get_all(state: &AppState, method: &Method) -> ApiResult {
    require_method(method, Method::GET)?;
    let snapshot = state.store().get_all().ok_or(ApiError::NoRecords)?;

    let notes: Vec<Note> = snapshot
        .into_iter()
        .map(|(id, pure)| pure.into_note(id))
        .collect();
    let data = to_json(&notes)?;
    info!(count = notes.len(), "OK - get-all");
    Ok(Envelope::ok(data))
}

/// Liveness response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nts_store::HashedStore;

    fn state() -> AppState {
        AppState::new(Arc::new(HashedStore::new(1)))
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn error_of(result: ApiResult) -> String {
        result.unwrap_err().to_string()
    }

    #[test]
    fn create_assigns_ids() {
        let state = state();
        let note = body(json!({"name": "Ivan", "last_name": "Ivanov", "note": "hi"}));
        let env = create(&state, &Method::POST, &note).unwrap();
        assert_eq!(env.data, Some(json!({"id": 1})));
        let env = create(&state, &Method::POST, &note).unwrap();
        assert_eq!(env.data, Some(json!({"id": 2})));
    }

    #[test]
    fn create_rejects_incomplete_and_bad_method() {
        let state = state();
        let partial = body(json!({"name": "Ivan", "note": "hi"}));
        assert_eq!(
            error_of(create(&state, &Method::POST, &partial)),
            "required data is missing"
        );
        assert_eq!(
            error_of(create(&state, &Method::GET, &partial)),
            "invalid request method: 'GET' (need 'POST')"
        );
        assert!(state.store().is_empty());
    }

    #[test]
    fn get_validates_id() {
        let state = state();
        assert_eq!(
            error_of(get(&state, &Method::POST, &body(json!({"id": 0})))),
            "invalid note id"
        );
        assert_eq!(
            error_of(get(&state, &Method::POST, b"{}")),
            "invalid note id"
        );
        assert_eq!(
            error_of(get(&state, &Method::POST, &body(json!({"id": 5})))),
            "cannot find note with id 5"
        );
    }

    #[test]
    fn update_missing_note() {
        let state = state();
        let note = body(json!({"id": 3, "name": "a", "last_name": "b", "note": "c"}));
        assert_eq!(
            error_of(update(&state, &Method::POST, &note)),
            "cannot update non-existing note with id 3"
        );
    }

    #[test]
    fn delete_then_get() {
        let state = state();
        let note = body(json!({"name": "a", "last_name": "b", "note": "c"}));
        create(&state, &Method::POST, &note).unwrap();

        let id = body(json!({"id": 1}));
        delete(&state, &Method::POST, &id).unwrap();
        assert_eq!(
            error_of(delete(&state, &Method::POST, &id)),
            "note with this ID doesn't exist: 1"
        );
        assert_eq!(
            error_of(get(&state, &Method::POST, &id)),
            "cannot find note with id 1"
        );
    }

    #[test]
    fn get_all_orders_by_id() {
        let state = state();
        for name in ["c", "a", "b"] {
            let note = body(json!({"name": name, "last_name": "x", "note": "y"}));
            create(&state, &Method::POST, &note).unwrap();
        }
        let env = get_all(&state, &Method::GET).unwrap();
        let ids: Vec<i64> = env
            .data
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn get_all_empty_and_wrong_method() {
        let state = state();
        assert_eq!(error_of(get_all(&state, &Method::GET)), "no records found");
        assert_eq!(
            error_of(get_all(&state, &Method::POST)),
            "invalid request method: 'POST' (need 'GET')"
        );
    }

    #[test]
    fn health_defaults() {
        let h = HealthResponse::default();
        assert_eq!(h.status, "ok");
        assert_eq!(h.version, env!("CARGO_PKG_VERSION"));
    }
}
