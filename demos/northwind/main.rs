//! Product grid backend seeded with the Northwind sample catalogue
//!
//! Run with the default configuration (in-memory store, port 3000):
//!
//! ```text
//! cargo run --example northwind
//! ```
//!
//! or pass a YAML configuration file:
//!
//! ```text
//! cargo run --example northwind --features postgres -- demos/northwind/northwind.yaml
//! ```

use datasource::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_yaml_file(&path)?,
        None => AppConfig::default(),
    };
    config.store.seed = true;
    let bind = config.server.bind.clone();

    println!("Northwind product grid");
    println!("======================\n");
    println!("Backend: {}", config.store.backend.as_str());
    println!("Listening on http://{}\n", bind);
    println!("Try:");
    println!("  curl http://{}/products/names", bind);
    println!(
        "  curl -X POST http://{}/products/read -H 'content-type: application/json' \\",
        bind
    );
    println!(
        r#"       -d '{{"take": 5, "skip": 0, "sort": [{{"field": "UnitPrice", "dir": "desc"}}], "filter": {{"field": "Discontinued", "operator": "eq", "value": false}}}}'"#
    );
    println!();

    ServerBuilder::from_config(config).await?.serve().await?;

    Ok(())
}
