pub mod adapters;
pub mod auth;
pub mod config;
pub mod db;
pub mod doc;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod ports;
pub mod validation;

use std::sync::Arc;

use axum::{
    Router,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::adapters::PostgresLedgerStore;
use crate::config::Config;
use crate::ledger::SettlementService;
use crate::ports::{FriendshipGate, TransactionStore};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: Config,
    pub store: Arc<dyn TransactionStore>,
    pub gate: Arc<dyn FriendshipGate>,
    pub settlements: Arc<SettlementService>,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: Config) -> Self {
        let ledger_store = Arc::new(PostgresLedgerStore::new(db.clone()));
        let store: Arc<dyn TransactionStore> = ledger_store.clone();
        let gate: Arc<dyn FriendshipGate> = ledger_store;
        let settlements = Arc::new(SettlementService::new(Arc::clone(&store), Arc::clone(&gate)));

        Self {
            db,
            config,
            store,
            gate,
            settlements,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(doc::openapi_json))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route(
            "/api/friends",
            get(handlers::friends::list_friends).post(handlers::friends::send_friend_request),
        )
        .route(
            "/api/friends/:friend_id",
            delete(handlers::friends::remove_friend),
        )
        .route(
            "/api/friends/requests",
            get(handlers::friends::list_friend_requests),
        )
        .route(
            "/api/friends/requests/:request_id",
            put(handlers::friends::respond_to_friend_request)
                .delete(handlers::friends::cancel_friend_request),
        )
        .route(
            "/api/transactions",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::create_transaction),
        )
        .route(
            "/api/transactions/balances",
            get(handlers::balances::list_balances),
        )
        .route(
            "/api/transactions/settle",
            post(handlers::settlement::settle),
        )
        .route(
            "/api/transactions/:transaction_id",
            get(handlers::transactions::get_transaction)
                .put(handlers::transactions::update_transaction)
                .delete(handlers::transactions::delete_transaction),
        )
        .layer(axum_middleware::from_fn(
            middleware::request_logger::request_logger,
        ))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(raw) => {
            let origins: Vec<HeaderValue> = raw
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new(),
    }
}
