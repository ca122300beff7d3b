//! Lists and items: typed views over server rows.
//!
//! # Design
//! A `List` or `Item` is built from the JSON mapping the server returned and
//! keeps an `Arc` to the session that fetched it, so it can issue its own
//! follow-up requests. There is no identity map: every fetch produces fresh
//! objects, and `delete` does not invalidate the local value.
//!
//! Ids are opaque. Some server versions send strings, others integers; both
//! are stored as the string the server would accept back in a path.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::client::Client;
use crate::config::ApiShape;
use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::session::{Payload, Session};
use crate::uri::{ITEMS_PATH, ITEM_FINISHED_PATH, ITEM_PATH, LIST_PATH};

/// Body for creating or renaming a list: `{"list":{"name":...}}`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ListPayload<'a> {
    pub list: NamePayload<'a>,
}

/// Body for creating or renaming an item: `{"item":{"name":...}}`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ItemPayload<'a> {
    pub item: NamePayload<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NamePayload<'a> {
    pub name: &'a str,
}

pub(crate) fn list_body(name: &str) -> Result<String, ApiError> {
    serde_json::to_string(&ListPayload {
        list: NamePayload { name },
    })
    .map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn item_body(name: &str) -> Result<String, ApiError> {
    serde_json::to_string(&ItemPayload {
        item: NamePayload { name },
    })
    .map_err(|e| ApiError::SerializationError(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct ListRecord {
    #[serde(deserialize_with = "opaque_id")]
    id: String,
    name: String,
    #[serde(default)]
    src: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemRecord {
    #[serde(deserialize_with = "opaque_id")]
    id: String,
    name: String,
    #[serde(default)]
    finished_at: Option<String>,
    #[serde(default)]
    src: Option<String>,
}

fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// A to-do list owned by the authenticated user.
#[derive(Clone)]
pub struct List {
    id: String,
    name: String,
    src: Option<String>,
    session: Arc<Session>,
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("src", &self.src)
            .finish()
    }
}

impl List {
    /// Build a list view from a server mapping holding at least `id` and
    /// `name`.
    pub fn from_value(client: &Client, value: &Value) -> Result<Self, ApiError> {
        Self::from_session(client.session(), value)
    }

    pub(crate) fn from_session(session: &Arc<Session>, value: &Value) -> Result<Self, ApiError> {
        let record = ListRecord::deserialize(value)?;
        Ok(Self {
            id: record.id,
            name: record.name,
            src: record.src,
            session: Arc::clone(session),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The server's URL for this list, when the protocol version sends one.
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    /// Rename the list. The local name is updated without re-reading the
    /// server's representation.
    pub fn update(&mut self, name: &str) -> Result<Payload, ApiError> {
        let payload = self.session.request(
            HttpMethod::Patch,
            LIST_PATH,
            &[("list_id", self.id.as_str())],
            Some(list_body(name)?),
        )?;
        self.name = name.to_string();
        Ok(payload)
    }

    /// Delete the list on the server. This value must not be used afterwards.
    pub fn delete(&self) -> Result<Payload, ApiError> {
        self.session
            .request(HttpMethod::Delete, LIST_PATH, &[("list_id", self.id.as_str())], None)
    }

    /// Fetch the list's items, in server order.
    pub fn items(&self) -> Result<Vec<Item>, ApiError> {
        let payload = self
            .session
            .request(HttpMethod::Get, LIST_PATH, &[("list_id", self.id.as_str())], None)?;

        let entries = match (self.session.shape(), payload.as_json()) {
            (ApiShape::Nested, Some(body)) => body.get("list").and_then(|list| list.get("items")),
            (ApiShape::Flat, Some(body)) => body.get("items"),
            (_, None) => None,
        }
        .and_then(Value::as_array)
        .ok_or_else(|| unexpected_shape("list items", &payload))?;

        entries
            .iter()
            .map(|entry| Item::from_session(&self.session, &self.id, entry))
            .collect()
    }

    /// Create an item in this list. Returns the created item when the server
    /// describes it in the response; otherwise `None`, and `items` must be
    /// fetched again to see it.
    pub fn new_item(&self, name: &str) -> Result<Option<Item>, ApiError> {
        let payload = self.session.request(
            HttpMethod::Post,
            ITEMS_PATH,
            &[("list_id", self.id.as_str())],
            Some(item_body(name)?),
        )?;
        Ok(created_record(&payload, "item")
            .and_then(|value| Item::from_session(&self.session, &self.id, value).ok()))
    }
}

/// A single to-do entry inside a list.
#[derive(Clone)]
pub struct Item {
    id: String,
    name: String,
    finished_at: Option<String>,
    src: Option<String>,
    list_id: String,
    session: Arc<Session>,
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("list_id", &self.list_id)
            .field("name", &self.name)
            .field("finished_at", &self.finished_at)
            .field("src", &self.src)
            .finish()
    }
}

impl Item {
    /// Build an item view belonging to `list` from a server mapping.
    pub fn from_value(list: &List, value: &Value) -> Result<Self, ApiError> {
        Self::from_session(&list.session, &list.id, value)
    }

    fn from_session(
        session: &Arc<Session>,
        list_id: &str,
        value: &Value,
    ) -> Result<Self, ApiError> {
        let record = ItemRecord::deserialize(value)?;
        Ok(Self {
            id: record.id,
            name: record.name,
            finished_at: record.finished_at,
            src: record.src,
            list_id: list_id.to_string(),
            session: Arc::clone(session),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server timestamp of completion, verbatim. `None` means not finished.
    pub fn finished_at(&self) -> Option<&str> {
        self.finished_at.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn mark_finished(&self) -> Result<Payload, ApiError> {
        self.session.request(
            HttpMethod::Put,
            ITEM_FINISHED_PATH,
            &[("list_id", self.list_id.as_str()), ("item_id", self.id.as_str())],
            None,
        )
    }

    /// Rename the item, updating the local name optimistically.
    pub fn update(&mut self, name: &str) -> Result<Payload, ApiError> {
        let payload = self.session.request(
            HttpMethod::Patch,
            ITEM_PATH,
            &[("list_id", self.list_id.as_str()), ("item_id", self.id.as_str())],
            Some(item_body(name)?),
        )?;
        self.name = name.to_string();
        Ok(payload)
    }

    pub fn delete(&self) -> Result<Payload, ApiError> {
        self.session.request(
            HttpMethod::Delete,
            ITEM_PATH,
            &[("list_id", self.list_id.as_str()), ("item_id", self.id.as_str())],
            None,
        )
    }
}

/// The created resource in a create response, either bare or wrapped under
/// `key`. Anything without an `id` is not a usable record.
pub(crate) fn created_record<'a>(payload: &'a Payload, key: &str) -> Option<&'a Value> {
    let body = payload.as_json()?;
    let record = body.get(key).unwrap_or(body);
    record.get("id").map(|_| record)
}

pub(crate) fn unexpected_shape(what: &str, payload: &Payload) -> ApiError {
    let found = match payload {
        Payload::Json(value) => value.to_string(),
        Payload::Text(text) => format!("text {text:?}"),
        Payload::Empty => "an empty body".to_string(),
    };
    ApiError::DeserializationError(format!("expected {what}, got {found}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_body_wraps_name() {
        assert_eq!(list_body("bar").unwrap(), r#"{"list":{"name":"bar"}}"#);
    }

    #[test]
    fn item_body_wraps_name() {
        assert_eq!(
            item_body("Sing with the birds").unwrap(),
            r#"{"item":{"name":"Sing with the birds"}}"#
        );
    }

    #[test]
    fn list_record_accepts_string_and_integer_ids() {
        let text: ListRecord =
            serde_json::from_value(json!({"name": "a", "id": "ae1-fce"})).unwrap();
        assert_eq!(text.id, "ae1-fce");
        let number: ListRecord =
            serde_json::from_value(json!({"name": "a", "id": 42})).unwrap();
        assert_eq!(number.id, "42");
        assert_eq!(number.src, None);
    }

    #[test]
    fn list_record_requires_id() {
        let result: Result<ListRecord, _> = serde_json::from_value(json!({"name": "a"}));
        assert!(result.is_err());
    }

    #[test]
    fn item_record_keeps_optional_fields() {
        let record: ItemRecord = serde_json::from_value(json!({
            "name": "Feed the cat",
            "finished_at": null,
            "src": "http://todoable.teachable.tech/api/lists/1/items/10",
            "id": "10"
        }))
        .unwrap();
        assert_eq!(record.finished_at, None);
        assert_eq!(
            record.src.as_deref(),
            Some("http://todoable.teachable.tech/api/lists/1/items/10")
        );
    }

    #[test]
    fn created_record_unwraps_key_or_takes_bare_mapping() {
        let wrapped = Payload::Json(json!({"list": {"id": "1", "name": "a"}}));
        assert_eq!(created_record(&wrapped, "list"), Some(&json!({"id": "1", "name": "a"})));

        let bare = Payload::Json(json!({"id": "1", "name": "a"}));
        assert!(created_record(&bare, "list").is_some());

        assert!(created_record(&Payload::Empty, "list").is_none());
        assert!(created_record(&Payload::Text("created".into()), "list").is_none());
        assert!(created_record(&Payload::Json(json!({"ok": true})), "list").is_none());
    }
}
