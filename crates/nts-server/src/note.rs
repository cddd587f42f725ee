//! Wire and storage shapes of a note.

use axum::response::{IntoResponse, Json, Response};
use nts_store::{Tagged, TypeTag};
use serde::{Deserialize, Serialize};

/// Id carried by a request that did not name one.
pub const UNSET_ID: i64 = -1;

fn unset_id() -> i64 {
    UNSET_ID
}

/// A note as clients send and receive it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    #[serde(default = "unset_id")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(rename = "note", default, skip_serializing_if = "String::is_empty")]
    pub content: String,
}

impl Default for Note {
    fn default() -> Self {
        Self {
            id: UNSET_ID,
            name: String::new(),
            last_name: String::new(),
            content: String::new(),
        }
    }
}

impl Note {
    /// True when any of the text fields is empty.
    pub fn is_incomplete(&self) -> bool {
        self.name.is_empty() || self.last_name.is_empty() || self.content.is_empty()
    }
}

/// A note as the store keeps it: the id is the store's key, not part of the
/// value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PureNote {
    pub name: String,
    pub last_name: String,
    pub content: String,
}

impl PureNote {
    /// Reattach an id for the wire.
    pub fn into_note(self, id: i64) -> Note {
        Note {
            id,
            name: self.name,
            last_name: self.last_name,
            content: self.content,
        }
    }
}

impl From<Note> for PureNote {
    fn from(note: Note) -> Self {
        Self {
            name: note.name,
            last_name: note.last_name,
            content: note.content,
        }
    }
}

impl Tagged for PureNote {
    fn type_tag(&self) -> TypeTag {
        TypeTag::new("note")
    }
}

/// Outcome marker of an [`Envelope`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// JSON body of every note endpoint response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub result: Outcome,
    pub data: Option<serde_json::Value>,
    pub error: String,
}

impl Envelope {
    /// Success carrying `data`.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            result: Outcome::Ok,
            data: Some(data),
            error: String::new(),
        }
    }

    /// Success without data.
    pub fn empty() -> Self {
        Self {
            result: Outcome::Ok,
            data: None,
            error: String::new(),
        }
    }

    /// Failure with a client-facing message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: Outcome::Error,
            data: None,
            error: message.into(),
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_take_defaults() {
        let note: Note = serde_json::from_str(r#"{"name": "Ivan"}"#).unwrap();
        assert_eq!(note.id, UNSET_ID);
        assert_eq!(note.name, "Ivan");
        assert!(note.content.is_empty());
        assert!(note.is_incomplete());
    }

    #[test]
    fn wire_field_names() {
        let note = Note {
            id: 3,
            name: "Ivan".into(),
            last_name: "Ivanov".into(),
            content: "hello".into(),
        };
        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            json!({"id": 3, "name": "Ivan", "last_name": "Ivanov", "note": "hello"})
        );
        assert!(!note.is_incomplete());
    }

    #[test]
    fn empty_text_fields_are_omitted() {
        let note = Note { id: 4, ..Note::default() };
        assert_eq!(serde_json::to_value(&note).unwrap(), json!({"id": 4}));
    }

    #[test]
    fn pure_note_drops_and_restores_id() {
        let note = Note {
            id: 9,
            name: "a".into(),
            last_name: "b".into(),
            content: "c".into(),
        };
        let pure = PureNote::from(note.clone());
        assert_eq!(pure.clone().into_note(9), note);
        assert_eq!(pure.into_note(10).id, 10);
    }

    #[test]
    fn envelope_shapes() {
        assert_eq!(
            serde_json::to_value(Envelope::ok(json!({"id": 1}))).unwrap(),
            json!({"result": "OK", "data": {"id": 1}, "error": ""})
        );
        assert_eq!(
            serde_json::to_value(Envelope::empty()).unwrap(),
            json!({"result": "OK", "data": null, "error": ""})
        );
        assert_eq!(
            serde_json::to_value(Envelope::error("no records found")).unwrap(),
            json!({"result": "ERROR", "data": null, "error": "no records found"})
        );
    }
}
