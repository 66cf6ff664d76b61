use axum::{
    routing::{get, post},
    Router,
};
use dotenvy::dotenv;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod models;
mod password;


use config::Config;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::signup,
        handlers::auth::login,
        handlers::tasks::create_task,
        handlers::tasks::get_tasks,
        handlers::tasks::get_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task
    ),
    components(
        schemas(
            models::User,
            models::Credentials,
            models::LoginResponse,
            models::MessageResponse,
            models::Task,
            models::CreateTask,
            models::UpdateTask,
            handlers::tasks::Pagination
        )
    ),
    tags(
        (name = "auth", description = "Sign-up and login"),
        (name = "tasks", description = "Task management endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,task_manager_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "configuration loaded");

    let pool = db::establish_connection(&config.database_url, config.max_connections).await?;

    let app = create_app(pool);

    let addr = config.server_addr()?;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn create_app(pool: SqlitePool) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(|| async { "Task manager API is running!" }))
        .route("/signup", post(handlers::auth::signup))
        .route("/login", post(handlers::auth::login))
        .route(
            "/tasks",
            post(handlers::tasks::create_task).get(handlers::tasks::get_tasks),
        )
        .route(
            "/tasks/:id",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(pool)
}
