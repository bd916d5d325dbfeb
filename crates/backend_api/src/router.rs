use axum::{
    extract::State,
    response::Html,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the application router. The dashboard is rendered once at startup;
/// the only route serves that cached page.
pub fn create_router(page: Arc<String>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(dashboard_page))
        .with_state(page)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn dashboard_page(State(page): State<Arc<String>>) -> Html<String> {
    Html(page.as_ref().clone())
}
