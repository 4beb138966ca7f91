//! StorePulse API Server
//!
//! Run with: cargo run --bin storepulse
//!
//! Configuration is loaded from `config.toml` (or the default locations)
//! with `STOREPULSE_*` environment overrides; command-line flags take
//! final precedence.
//!
//! ```text
//! storepulse --port 8086 --demo
//! storepulse --init-config > config.toml
//! ```

use anyhow::Result;
use clap::Parser;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storepulse::analytics::{AggregationEngine, EngineConfig};
use storepulse::api::{serve, ApiConfig, AppState};
use storepulse::config::{generate_default_config, Config};
use storepulse::store::{
    GatewayClient, GatewayConfig, LineItem, MemoryStore, ProductRecord, SaleRecord, StoreQuery,
};

#[derive(Parser)]
#[command(
    name = "storepulse",
    version,
    about = "Real-time retail sales analytics server"
)]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Override the API port
    #[arg(long)]
    port: Option<u16>,

    /// Seed the embedded store with demo data
    #[arg(long)]
    demo: bool,

    /// Print a default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.init_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(port) = args.port {
        config.api.port = port;
    }

    init_tracing(&config);

    tracing::info!("StorePulse v{}", env!("CARGO_PKG_VERSION"));

    // Embedded store backs the change feed and the ingest endpoints
    let store = Arc::new(MemoryStore::new());

    // Point queries go to the remote billing gateway when configured,
    // otherwise to the embedded store
    let query: Arc<dyn StoreQuery> = if config.gateway.enabled {
        tracing::info!(url = %config.gateway.url, "Routing point queries to billing gateway");
        let gateway = GatewayClient::new(GatewayConfig {
            base_url: config.gateway.url.clone(),
            request_timeout_ms: config.gateway.request_timeout_ms,
        });
        match gateway.health_check().await {
            Ok(_) => tracing::info!("Billing gateway connection verified"),
            Err(e) => tracing::warn!("Billing gateway not available: {} (refresh will fail)", e),
        }
        Arc::new(gateway)
    } else {
        store.clone()
    };

    let engine_config = EngineConfig {
        top_k: config.engine.top_k,
        low_stock_threshold: config.engine.low_stock_threshold,
        window_days: config.engine.window_days,
    };
    let engine = Arc::new(AggregationEngine::new(
        store.clone(),
        query,
        engine_config,
    ));

    let subscription = engine.subscribe().await?;

    if args.demo {
        seed_demo_data(&store).await;
    }

    let api_config = ApiConfig::from(&config.api);
    tracing::info!("Starting server on {}", api_config.addr());

    let state = AppState::new(Arc::clone(&engine), Arc::clone(&store), api_config.clone());
    serve(state, &api_config).await?;

    subscription.unsubscribe().await;
    tracing::info!("StorePulse stopped");

    Ok(())
}

/// Initialize tracing from the logging section
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "storepulse={},tower_http=info",
            config.logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Seed the embedded store with a small catalog and a week of sales
async fn seed_demo_data(store: &MemoryStore) {
    tracing::info!("Seeding demo data...");

    let catalog = [
        ("p1", "Laptop", "Electronics", Some(50_000), 8),
        ("p2", "Wireless Mouse", "Electronics", Some(499), 42),
        ("p3", "USB-C Cable", "Accessories", Some(299), 15),
        ("p4", "Notebook", "Stationery", Some(60), 0),
        ("p5", "Desk Lamp", "Home", None, 12),
    ];

    for (id, name, category, price, quantity) in catalog {
        store
            .upsert_product(ProductRecord {
                id: id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                price: price.map(Decimal::from),
                quantity,
            })
            .await;
    }

    let today = chrono::Utc::now().date_naive();
    let mut bill_no = 0;

    for days_ago in (0..7i64).rev() {
        let date = today - chrono::Duration::days(days_ago);
        for (product_id, name, unit_price, quantity) in [
            ("p2", "Wireless Mouse", 499, 2),
            ("p3", "USB-C Cable", 299, 1 + days_ago % 3),
        ] {
            bill_no += 1;
            let unit_price = Decimal::from(unit_price);
            let line_total = unit_price * Decimal::from(quantity);
            store
                .add_bill(SaleRecord {
                    id: format!("demo-{}", bill_no),
                    date_key: date.format("%Y-%m-%d").to_string(),
                    items: vec![LineItem {
                        product_id: product_id.to_string(),
                        product_name: name.to_string(),
                        unit_price,
                        quantity,
                        line_total,
                    }],
                    total: line_total,
                })
                .await;
        }
    }

    tracing::info!(bills = bill_no, products = 5, "Demo data seeded");
}
