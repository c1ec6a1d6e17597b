use axum::Router;
use axum::response::Json;
use axum::routing::get;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::Config;
use crate::todo::api::{self, TodoState, create_todo_router};
use crate::todo::TodoStore;
use crate::todo::store::SeaOrmTodoStore;

/// OpenAPI document for the todo routes.
#[derive(OpenApi)]
#[openapi(
    paths(
        api::create_todo_handler,
        api::list_todos_handler,
        api::get_todo_handler,
        api::delete_todo_handler,
        api::update_todo_handler,
    ),
    components(schemas(
        api::TodoJson,
        api::TodoResponse,
        api::TodosResponse,
        api::CreateTodoRequest,
        api::UpdateTodoRequest,
        api::ErrorResponse,
    )),
    tags((name = "Todos", description = "Todo list management"))
)]
pub struct ApiDoc;

/// Builds the application router on top of the given store.
pub fn create_app(store: Arc<dyn TodoStore>) -> Router {
    let todo_router = create_todo_router(Arc::new(TodoState { store }));

    Router::new()
        .route("/health", get(health_check_handler))
        .route("/api-docs/openapi.json", get(openapi_handler))
        .merge(todo_router)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Server is up on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let store = Arc::new(SeaOrmTodoStore::new(Arc::new(db)));
    let app = create_app(store);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
