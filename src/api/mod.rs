use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::models::recipe::PageRequest;
use crate::state::SharedState;

pub mod auth;
mod catalog;
mod error;
mod observability;
pub mod recipes;
mod short_links;
pub mod types;
mod users;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{
    AuthService, CatalogService, RecipeService, ShoppingListService, ShortLinkService,
    UserService,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn user_service(&self) -> &Arc<dyn UserService> {
        &self.shared.user_service
    }

    #[must_use]
    pub fn catalog_service(&self) -> &Arc<dyn CatalogService> {
        &self.shared.catalog_service
    }

    #[must_use]
    pub fn recipe_service(&self) -> &Arc<dyn RecipeService> {
        &self.shared.recipe_service
    }

    #[must_use]
    pub fn shopping_list_service(&self) -> &Arc<dyn ShoppingListService> {
        &self.shared.shopping_list_service
    }

    #[must_use]
    pub fn short_link_service(&self) -> &Arc<dyn ShortLinkService> {
        &self.shared.short_link_service
    }

    /// Clamps client paging parameters to the configured bounds.
    pub async fn page_request(&self, page: Option<u64>, limit: Option<u64>) -> PageRequest {
        let config = self.config().read().await;
        PageRequest::new(
            page,
            limit,
            config.server.default_page_size,
            config.server.max_page_size,
        )
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (images_path, cors_origins, secure_cookies) = {
        let config = state.config().read().await;
        (
            config.general.images_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(60)));

    let api_router = Router::new()
        .merge(create_public_router(state.clone()))
        .merge(create_protected_router(state.clone()))
        .layer(session_layer)
        .with_state(state.clone());

    let short_link_router = Router::new()
        .route("/s/{token}", get(short_links::follow))
        .route("/s/{token}/", get(short_links::follow))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .merge(short_link_router)
        .nest_service("/media", tower_http::services::ServeDir::new(images_path))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes open to anonymous callers. Credentials, when present, still
/// identify the viewer for `is_subscribed`/`is_favorited` flags.
fn create_public_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users).post(users::register))
        .route("/users/{id}", get(users::get_user))
        .route("/tags", get(catalog::list_tags))
        .route("/tags/{id}", get(catalog::get_tag))
        .route("/ingredients", get(catalog::list_ingredients))
        .route("/ingredients/{id}", get(catalog::get_ingredient))
        .route("/recipes", get(recipes::list_recipes))
        .route("/recipes/{id}", get(recipes::get_recipe))
        .route("/recipes/{id}/get-link", get(short_links::get_link))
        .route("/recipes/{id}/get-link/", get(short_links::get_link))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::identify_middleware,
        ))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/users/me", get(users::me))
        .route(
            "/users/me/avatar",
            put(users::set_avatar).delete(users::delete_avatar),
        )
        .route("/users/set_password", post(users::set_password))
        .route("/users/subscriptions", get(users::subscriptions))
        .route(
            "/users/{id}/subscribe",
            post(users::subscribe).delete(users::unsubscribe),
        )
        .route("/recipes", post(recipes::create_recipe))
        .route(
            "/recipes/{id}",
            axum::routing::patch(recipes::update_recipe).delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/{id}/favorite",
            post(recipes::add_favorite).delete(recipes::remove_favorite),
        )
        .route(
            "/recipes/{id}/shopping_cart",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
