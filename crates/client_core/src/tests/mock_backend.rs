//! In-process stand-in for the budget REST backend.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use shared::{
    domain::{Category, CategoryId, HouseholdRef},
    protocol::{
        ApiEnvelope, CreateCategoryRequest, LoginRequest, RegisterRequest, UpdateCategoryRequest,
    },
};
use tokio::{net::TcpListener, sync::Mutex};

pub const VALID_PASSWORD: &str = "correct horse";
pub const ISSUED_TOKEN: &str = "token-abc";

#[derive(Clone, Default)]
pub struct BackendState {
    pub categories: Arc<Mutex<Vec<Category>>>,
    pub authorization_headers: Arc<Mutex<Vec<Option<String>>>>,
    pub registrations: Arc<Mutex<Vec<RegisterRequest>>>,
}

pub struct MockBackend {
    pub url: String,
    pub state: BackendState,
}

impl MockBackend {
    pub async fn category_ids(&self) -> Vec<i64> {
        self.state
            .categories
            .lock()
            .await
            .iter()
            .map(|category| category.id.0)
            .collect()
    }
}

pub async fn spawn_backend(initial: Vec<Category>) -> MockBackend {
    let state = BackendState::default();
    *state.categories.lock().await = initial;

    let app = Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        )
        .route("/login", post(login))
        .route("/register", post(register))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockBackend {
        url: format!("http://{addr}"),
        state,
    }
}

async fn record_authorization(state: &BackendState, headers: &HeaderMap) {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.authorization_headers.lock().await.push(value);
}

async fn list_categories(
    State(state): State<BackendState>,
    headers: HeaderMap,
) -> Json<ApiEnvelope<Vec<Category>>> {
    record_authorization(&state, &headers).await;
    Json(ApiEnvelope::ok(state.categories.lock().await.clone()))
}

async fn create_category(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Json(request): Json<CreateCategoryRequest>,
) -> (StatusCode, Json<Value>) {
    record_authorization(&state, &headers).await;
    let mut categories = state.categories.lock().await;
    if categories
        .iter()
        .any(|category| category.name.eq_ignore_ascii_case(&request.name))
    {
        return (
            StatusCode::OK,
            Json(json!({"success": false, "message": "name already used"})),
        );
    }

    let id = categories
        .iter()
        .map(|category| category.id.0)
        .max()
        .unwrap_or(0)
        + 1;
    let now = Utc::now();
    let is_active = request.is_active.unwrap_or(true);
    let status = if is_active { "Actif" } else { "Inactif" };
    categories.push(Category {
        id: CategoryId(id),
        name: request.name,
        description: request.description,
        status: status.to_string(),
        is_active,
        household: request.household_id.map(|household_id| HouseholdRef {
            id: household_id,
            name: format!("Household {household_id}"),
        }),
        created_at: now,
        updated_at: now,
        comment: None,
    });
    (
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "created"})),
    )
}

async fn update_category(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> (StatusCode, Json<Value>) {
    record_authorization(&state, &headers).await;
    let mut categories = state.categories.lock().await;
    let Some(category) = categories
        .iter_mut()
        .find(|category| category.id == CategoryId(id))
    else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "category not found"})),
        );
    };

    if let Some(name) = request.name {
        category.name = name;
    }
    if let Some(description) = request.description {
        category.description = Some(description);
    }
    if let Some(is_active) = request.is_active {
        category.is_active = is_active;
    }
    category.updated_at = Utc::now();
    (StatusCode::OK, Json(json!({"success": true})))
}

async fn delete_category(
    State(state): State<BackendState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    record_authorization(&state, &headers).await;
    let mut categories = state.categories.lock().await;
    let before = categories.len();
    categories.retain(|category| category.id != CategoryId(id));
    if categories.len() == before {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "category not found"})),
        )
            .into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn login(Json(request): Json<LoginRequest>) -> (StatusCode, Json<Value>) {
    if request.email == "tokenless@example.com" {
        return (StatusCode::OK, Json(json!({"user": null})));
    }
    if request.password != VALID_PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "invalid credentials"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": ISSUED_TOKEN,
            "user": {"id": 1, "username": "camille", "email": request.email}
        })),
    )
}

async fn register(
    State(state): State<BackendState>,
    Json(request): Json<RegisterRequest>,
) -> (StatusCode, Json<Value>) {
    if request.email == "taken@example.com" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"success": false, "message": "email already registered"})),
        );
    }
    state.registrations.lock().await.push(request);
    (StatusCode::CREATED, Json(json!({"success": true})))
}
