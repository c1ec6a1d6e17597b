use crate::todo::{Todo, TodoError, TodoService, TodoStore, TodoUpdate};
use axum::{
    Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared state for the todo routes.
#[derive(Clone)]
pub struct TodoState {
    pub store: Arc<dyn TodoStore>,
}

/// JSON representation of a Todo for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodoJson {
    /// Identifier assigned by the store
    #[serde(rename = "_id")]
    id: String,
    /// The todo text
    text: String,
    /// Whether the todo has been completed
    completed: bool,
    /// Completion time in epoch milliseconds, null unless completed
    completed_at: Option<i64>,
}

impl From<Todo> for TodoJson {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id().to_string(),
            text: todo.text().to_string(),
            completed: todo.completed(),
            completed_at: todo.completed_at(),
        }
    }
}

/// API response wrapping a single todo.
#[derive(Debug, Serialize, ToSchema)]
pub struct TodoResponse {
    todo: TodoJson,
}

/// API response for listing all todos.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TodosResponse {
    all_todos: Vec<TodoJson>,
}

/// Request payload for creating a todo.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    /// The todo text, must not be blank
    #[serde(default)]
    text: Option<String>,
}

/// Request payload for a partial update. Fields left out are not changed.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
}

impl From<UpdateTodoRequest> for TodoUpdate {
    fn from(request: UpdateTodoRequest) -> Self {
        Self {
            text: request.text,
            completed: request.completed,
        }
    }
}

/// JSON response for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<JsonRejection> for TodoError {
    fn from(rejection: JsonRejection) -> Self {
        TodoError::Validation(rejection.body_text())
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let (status_code, error) = match &self {
            TodoError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            TodoError::InvalidId(_) | TodoError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            TodoError::Storage(err) => {
                tracing::error!("Todo storage operation failed: {}", err);
                (StatusCode::BAD_REQUEST, "STORAGE_ERROR")
            }
        };

        let error_response = ErrorResponse {
            error: error.to_string(),
            message: self.to_string(),
        };
        (status_code, Json(error_response)).into_response()
    }
}

/// Handler for POST /todos - Creates a todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 200, description = "Todo created", body = TodoJson),
        (status = 400, description = "Missing or blank text, or storage failure", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn create_todo_handler(
    State(state): State<Arc<TodoState>>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoJson>, TodoError> {
    let Json(payload) = payload?;
    let service = TodoService::new(state.store.as_ref());
    let todo = service.create_todo(payload.text).await?;
    Ok(Json(TodoJson::from(todo)))
}

/// Handler for GET /todos - Returns all todos.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos",
    responses(
        (status = 200, description = "Successfully retrieved todos", body = TodosResponse),
        (status = 400, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn list_todos_handler(
    State(state): State<Arc<TodoState>>,
) -> Result<Json<TodosResponse>, TodoError> {
    let service = TodoService::new(state.store.as_ref());
    let todos = service.get_all_todos().await?;
    Ok(Json(TodosResponse {
        all_todos: todos.into_iter().map(TodoJson::from).collect(),
    }))
}

/// Handler for GET /todos/{id} - Returns a single todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/todos/{id}",
    params(("id" = String, Path, description = "Todo identifier")),
    responses(
        (status = 200, description = "Todo found", body = TodoResponse),
        (status = 404, description = "Malformed id or no such todo", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn get_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, TodoError> {
    let service = TodoService::new(state.store.as_ref());
    let todo = service.get_todo_by_id(&id).await?;
    Ok(Json(TodoResponse {
        todo: TodoJson::from(todo),
    }))
}

/// Handler for DELETE /todos/{id} - Deletes a todo and returns it.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/todos/{id}",
    params(("id" = String, Path, description = "Todo identifier")),
    responses(
        (status = 200, description = "Todo deleted", body = TodoResponse),
        (status = 404, description = "Malformed id or no such todo", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn delete_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, TodoError> {
    let service = TodoService::new(state.store.as_ref());
    let todo = service.delete_todo_by_id(&id).await?;
    Ok(Json(TodoResponse {
        todo: TodoJson::from(todo),
    }))
}

/// Handler for PATCH /todos/{id} - Partially updates a todo.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    patch,
    path = "/todos/{id}",
    params(("id" = String, Path, description = "Todo identifier")),
    request_body = UpdateTodoRequest,
    responses(
        (status = 200, description = "Todo updated", body = TodoResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Malformed id or no such todo", body = ErrorResponse)
    ),
    tag = "Todos"
)]
pub async fn update_todo_handler(
    State(state): State<Arc<TodoState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<TodoResponse>, TodoError> {
    let service = TodoService::new(state.store.as_ref());
    // A malformed id is reported as 404 even when the body is also unusable.
    service.ensure_valid_id(&id)?;
    let Json(payload) = payload?;
    let todo = service.update_todo_by_id(&id, payload.into()).await?;
    Ok(Json(TodoResponse {
        todo: TodoJson::from(todo),
    }))
}

/// Creates and returns the todo router.
pub fn create_todo_router(state: Arc<TodoState>) -> Router {
    Router::new()
        .route("/todos", get(list_todos_handler).post(create_todo_handler))
        .route(
            "/todos/{id}",
            get(get_todo_handler)
                .delete(delete_todo_handler)
                .patch(update_todo_handler),
        )
        .with_state(state)
}
