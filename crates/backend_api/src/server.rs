use std::net::SocketAddr;
use std::sync::Arc;

use crate::router::create_router;

/// Run the dashboard server. Blocks accepting page-view connections; the
/// pipeline never runs again after this point.
pub async fn run_server(page: Arc<String>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(page);

    let addr = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    tracing::info!("Serving dashboard on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
