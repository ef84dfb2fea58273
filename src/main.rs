use std::sync::Arc;

use accounts_api::mailer::LoggingMailer;
use accounts_api::session::deny_list::InMemoryTokenDenyList;
use accounts_api::session::token::TokenConfig;
use accounts_api::shared::AppState;
use accounts_api::user::repository::InMemoryUserRepository;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "accounts_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting user-account API server");

    // Create shared application state with dependency injection
    // Easy to switch between implementations:
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let deny_list = Arc::new(InMemoryTokenDenyList::new());

    // For production with PostgreSQL:
    // let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    // let pool = sqlx::PgPool::connect(&database_url).await.expect("Failed to connect to database");
    // let user_repository = Arc::new(accounts_api::user::repository::PostgresUserRepository::new(pool.clone()));
    // let deny_list = Arc::new(accounts_api::session::deny_list::PostgresTokenDenyList::new(pool));

    let mailer = Arc::new(LoggingMailer::new());
    let state = AppState::new(user_repository, deny_list, mailer, TokenConfig::new());

    let app = accounts_api::router(state);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
