use backend_api::{render_page, run_server};
use data_pipeline::Config;
use std::sync::Arc;
use std::{env, path::PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "backend_api=debug,data_pipeline=info,tower_http=debug".into()
            }),
        )
        .init();

    // Environment overrides with defaults matching the stock setup
    let input_path = env::var("DATA_PATH").unwrap_or_else(|_| "data_kpi.xlsx".to_string());
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8050".to_string())
        .parse()
        .unwrap_or(8050);

    let cfg = Config {
        input_path: PathBuf::from(&input_path),
    };

    // One-shot batch: any pipeline failure is fatal before the server starts
    let dashboard = match data_pipeline::run(&cfg) {
        Ok(dashboard) => dashboard,
        Err(err) => {
            eprintln!("[FATAL] {err:#}");
            std::process::exit(1);
        }
    };

    let page = Arc::new(render_page(&dashboard));
    run_server(page, &host, port).await?;

    Ok(())
}
