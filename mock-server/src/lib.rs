use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Duration, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const TOKEN_LIFETIME_MINUTES: i64 = 20;

#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "user".to_string(),
            password: "password".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoList {
    pub name: String,
    pub src: String,
    pub id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    pub name: String,
    pub finished_at: Option<String>,
    pub src: String,
    pub id: String,
}

#[derive(Deserialize)]
pub struct NameInput {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ListInput {
    pub list: NameInput,
}

#[derive(Deserialize)]
pub struct ItemInput {
    pub item: NameInput,
}

#[derive(Debug)]
struct StoredList {
    list: TodoList,
    items: Vec<TodoItem>,
}

#[derive(Debug)]
pub struct AppState {
    credentials: Credentials,
    tokens: RwLock<HashSet<String>>,
    lists: RwLock<Vec<StoredList>>,
}

pub type Db = Arc<AppState>;

pub fn app() -> Router {
    app_with_credentials(Credentials::default())
}

pub fn app_with_credentials(credentials: Credentials) -> Router {
    let db: Db = Arc::new(AppState {
        credentials,
        tokens: RwLock::new(HashSet::new()),
        lists: RwLock::new(Vec::new()),
    });

    let api = Router::new()
        .route("/api/lists", get(list_lists).post(create_list))
        .route(
            "/api/lists/{list_id}",
            get(get_list).patch(update_list).delete(delete_list),
        )
        .route("/api/lists/{list_id}/items", get(list_items).post(create_item))
        .route(
            "/api/lists/{list_id}/items/{item_id}",
            patch(update_item).delete(delete_item),
        )
        .route("/api/lists/{list_id}/items/{item_id}/finish", put(finish_item))
        .route_layer(middleware::from_fn_with_state(db.clone(), require_token));

    Router::new()
        .route("/api/authenticate", post(authenticate))
        .merge(api)
        .with_state(db)
}

pub async fn run(listener: TcpListener, credentials: Credentials) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_credentials(credentials)).await
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Token token=\"")?
        .strip_suffix('"')
}

fn src_for(headers: &HeaderMap, path: &str) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}{path}")
}

async fn authenticate(State(db): State<Db>, headers: HeaderMap) -> Response {
    match basic_credentials(&headers) {
        Some((username, password))
            if username == db.credentials.username && password == db.credentials.password =>
        {
            let token = Uuid::new_v4().to_string();
            db.tokens.write().await.insert(token.clone());
            info!("issued token for {username}");
            let expires_at = Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES);
            Json(json!({ "token": token, "expires_at": expires_at.to_rfc3339() })).into_response()
        }
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn require_token(
    State(db): State<Db>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(request.headers()).map(str::to_string);
    let known = match token {
        Some(token) => db.tokens.read().await.contains(&token),
        None => false,
    };
    if !known {
        debug!("rejected {} {}", request.method(), request.uri());
        return Err(StatusCode::UNAUTHORIZED);
    }
    debug!("{} {}", request.method(), request.uri());
    Ok(next.run(request).await)
}

async fn list_lists(State(db): State<Db>) -> Json<serde_json::Value> {
    let lists = db.lists.read().await;
    let lists: Vec<&TodoList> = lists.iter().map(|stored| &stored.list).collect();
    Json(json!({ "lists": lists }))
}

async fn create_list(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ListInput>,
) -> Result<(StatusCode, Json<TodoList>), StatusCode> {
    if input.list.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let id = Uuid::new_v4().to_string();
    let list = TodoList {
        name: input.list.name,
        src: src_for(&headers, &format!("/api/lists/{id}")),
        id,
    };
    db.lists.write().await.push(StoredList {
        list: list.clone(),
        items: Vec::new(),
    });
    Ok((StatusCode::CREATED, Json(list)))
}

async fn get_list(
    State(db): State<Db>,
    Path(list_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let lists = db.lists.read().await;
    let stored = lists
        .iter()
        .find(|stored| stored.list.id == list_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({
        "list": { "name": stored.list.name, "items": stored.items }
    })))
}

async fn update_list(
    State(db): State<Db>,
    Path(list_id): Path<String>,
    Json(input): Json<ListInput>,
) -> Result<String, StatusCode> {
    let mut lists = db.lists.write().await;
    let stored = lists
        .iter_mut()
        .find(|stored| stored.list.id == list_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    stored.list.name = input.list.name;
    Ok(format!("{} updated", stored.list.name))
}

async fn delete_list(
    State(db): State<Db>,
    Path(list_id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut lists = db.lists.write().await;
    let position = lists
        .iter()
        .position(|stored| stored.list.id == list_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    lists.remove(position);
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items(
    State(db): State<Db>,
    Path(list_id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let lists = db.lists.read().await;
    let stored = lists
        .iter()
        .find(|stored| stored.list.id == list_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(json!({ "items": stored.items })))
}

async fn create_item(
    State(db): State<Db>,
    Path(list_id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<ItemInput>,
) -> Result<(StatusCode, Json<TodoItem>), StatusCode> {
    if input.item.name.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let mut lists = db.lists.write().await;
    let stored = lists
        .iter_mut()
        .find(|stored| stored.list.id == list_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let id = Uuid::new_v4().to_string();
    let item = TodoItem {
        name: input.item.name,
        finished_at: None,
        src: src_for(&headers, &format!("/api/lists/{list_id}/items/{id}")),
        id,
    };
    stored.items.push(item.clone());
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_item(
    State(db): State<Db>,
    Path((list_id, item_id)): Path<(String, String)>,
    Json(input): Json<ItemInput>,
) -> Result<Json<TodoItem>, StatusCode> {
    let mut lists = db.lists.write().await;
    let item = find_item(&mut lists, &list_id, &item_id)?;
    item.name = input.item.name;
    Ok(Json(item.clone()))
}

async fn finish_item(
    State(db): State<Db>,
    Path((list_id, item_id)): Path<(String, String)>,
) -> Result<String, StatusCode> {
    let mut lists = db.lists.write().await;
    let item = find_item(&mut lists, &list_id, &item_id)?;
    item.finished_at = Some(Utc::now().to_rfc3339());
    Ok(format!("{} finished", item.name))
}

async fn delete_item(
    State(db): State<Db>,
    Path((list_id, item_id)): Path<(String, String)>,
) -> Result<StatusCode, StatusCode> {
    let mut lists = db.lists.write().await;
    let stored = lists
        .iter_mut()
        .find(|stored| stored.list.id == list_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let position = stored
        .items
        .iter()
        .position(|item| item.id == item_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    stored.items.remove(position);
    Ok(StatusCode::NO_CONTENT)
}

fn find_item<'a>(
    lists: &'a mut [StoredList],
    list_id: &str,
    item_id: &str,
) -> Result<&'a mut TodoItem, StatusCode> {
    lists
        .iter_mut()
        .find(|stored| stored.list.id == list_id)
        .ok_or(StatusCode::NOT_FOUND)?
        .items
        .iter_mut()
        .find(|item| item.id == item_id)
        .ok_or(StatusCode::NOT_FOUND)
}
