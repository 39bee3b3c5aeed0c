use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use order_workflow::adapters::{
    AddressDirectory, GuardedPriceFetcher, InMemoryCatalog, RetryingAddressChecker,
};
use order_workflow::config::WorkflowConfig;
use order_workflow::domain::order::{
    Command, PlaceOrder, PlaceOrderWorkflow, Price, ProductCode, UnvalidatedAddress,
    UnvalidatedCustomerInfo, UnvalidatedOrder, UnvalidatedOrderLine, WorkflowDependencies,
};
use order_workflow::metrics::WorkflowMetrics;
use order_workflow::utils::{CircuitBreakerConfig, RetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WorkflowConfig::load()?;

    // Default filter comes from config, RUST_LOG overrides it
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
        )
        .init();

    tracing::info!("🚀 Starting place-order workflow demo");

    // === 1. Metrics ===
    let metrics = Arc::new(WorkflowMetrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    // === 2. Collaborators (with resilience wrappers) ===
    let catalog: InMemoryCatalog = vec![
        (ProductCode::parse("W1234")?, Price::new(Decimal::new(1000, 2))?),
        (ProductCode::parse("G123")?, Price::new(Decimal::new(250, 2))?),
        (ProductCode::parse("SAMPLE")?, Price::zero()),
    ]
    .into_iter()
    .collect();
    let catalog = Arc::new(catalog);

    let address_checker = RetryingAddressChecker::new(
        AddressDirectory::new(["12345", "90210"]),
        RetryConfig::from(&config.address_retry),
    );

    let price_fetcher = GuardedPriceFetcher::new(
        catalog.clone(),
        CircuitBreakerConfig::from(&config.price_circuit),
        config.price_lookup_timeout(),
    )
    .with_metrics(metrics.clone());

    // === 3. Workflow, assembled once ===
    let workflow = PlaceOrderWorkflow::new(WorkflowDependencies {
        product_checker: catalog,
        address_checker: Arc::new(address_checker),
        price_fetcher: Arc::new(price_fetcher),
    })
    .with_metrics(metrics.clone());

    // === 4. Sample orders ===
    let samples = vec![
        ("ORD-001", vec![("W1234", 2), ("G123", 4)]),
        ("ORD-002", vec![("X999", 1)]),
        ("ORD-003", vec![("SAMPLE", 3)]),
    ];

    for (order_id, lines) in samples {
        let command = Command::new(sample_order(order_id, &lines), "demo-user");

        match workflow.place_order(command).await {
            Ok(events) => {
                for event in &events {
                    tracing::info!(
                        event_type = event.event_type(),
                        payload = %serde_json::to_string(event)?,
                        "📤 Event emitted"
                    );
                }
            }
            Err(error) => {
                tracing::warn!(order_id = order_id, kind = error.kind(), "❌ {}", error);
            }
        }
    }

    tracing::info!("📊 Metrics:\n{}", metrics.render()?);
    tracing::info!("🎉 Demo complete!");

    Ok(())
}

fn sample_order(order_id: &str, lines: &[(&str, i32)]) -> UnvalidatedOrder {
    UnvalidatedOrder {
        order_id: order_id.to_string(),
        customer_info: UnvalidatedCustomerInfo {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email_address: "grace@example.com".to_string(),
        },
        shipping_address: UnvalidatedAddress {
            address_line1: "1 Main St".to_string(),
            address_line2: String::new(),
            city: "Springfield".to_string(),
            zip_code: "12345".to_string(),
            state: "il".to_string(),
            country: "us".to_string(),
        },
        billing_address: None,
        lines: lines
            .iter()
            .map(|(code, quantity)| UnvalidatedOrderLine {
                product_code: code.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}
