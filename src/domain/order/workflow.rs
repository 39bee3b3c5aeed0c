use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::metrics::WorkflowMetrics;

use super::collaborators::{AddressChecker, ProductCodeChecker, ProductPriceFetcher};
use super::commands::PlaceOrderCommand;
use super::errors::PlaceOrderError;
use super::events::PlaceOrderEvent;
use super::pricing::price_order;
use super::projection::to_events;
use super::validation::validate_order;

// ============================================================================
// Place Order Workflow
// ============================================================================
//
// Orchestrates: Command -> Validation -> Pricing -> Events
//
// Callers only see `PlaceOrder::place_order(command)`. The collaborators are
// bound once, when startup code builds the workflow from its dependencies.
//
// ============================================================================

/// Public entry point of the workflow.
///
/// The steps behind it cannot be called directly:
///
/// ```compile_fail
/// use order_workflow::domain::order::validate_order;
/// ```
///
/// ```compile_fail
/// use order_workflow::domain::order::pricing::price_order;
/// ```
///
/// ```compile_fail
/// use order_workflow::domain::order::projection::to_events;
/// ```
#[async_trait]
pub trait PlaceOrder: Send + Sync {
    async fn place_order(
        &self,
        command: PlaceOrderCommand,
    ) -> Result<Vec<PlaceOrderEvent>, PlaceOrderError>;
}

/// Collaborators the workflow is assembled from
#[derive(Clone)]
pub struct WorkflowDependencies {
    pub product_checker: Arc<dyn ProductCodeChecker>,
    pub address_checker: Arc<dyn AddressChecker>,
    pub price_fetcher: Arc<dyn ProductPriceFetcher>,
}

/// Stages of one workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Received,
    Validating,
    ValidationFailed,
    Validated,
    Pricing,
    PricingFailed,
    Priced,
    EventsEmitted,
}

impl WorkflowStage {
    pub fn is_terminal(&self) -> bool {
        match self {
            WorkflowStage::ValidationFailed
            | WorkflowStage::PricingFailed
            | WorkflowStage::EventsEmitted => true,
            WorkflowStage::Received
            | WorkflowStage::Validating
            | WorkflowStage::Validated
            | WorkflowStage::Pricing
            | WorkflowStage::Priced => false,
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn enter(stage: WorkflowStage) {
    tracing::debug!(stage = %stage, terminal = stage.is_terminal(), "Workflow stage");
}

pub struct PlaceOrderWorkflow {
    dependencies: WorkflowDependencies,
    metrics: Option<Arc<WorkflowMetrics>>,
}

impl PlaceOrderWorkflow {
    pub fn new(dependencies: WorkflowDependencies) -> Self {
        Self {
            dependencies,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<WorkflowMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn run(
        &self,
        command: PlaceOrderCommand,
    ) -> Result<Vec<PlaceOrderEvent>, PlaceOrderError> {
        let deps = &self.dependencies;
        enter(WorkflowStage::Received);

        enter(WorkflowStage::Validating);
        let validated = match validate_order(
            deps.product_checker.as_ref(),
            deps.address_checker.as_ref(),
            command.data,
        )
        .await
        {
            Ok(order) => order,
            Err(errors) => {
                enter(WorkflowStage::ValidationFailed);
                return Err(PlaceOrderError::from(errors));
            }
        };
        enter(WorkflowStage::Validated);

        enter(WorkflowStage::Pricing);
        let priced = match price_order(deps.price_fetcher.as_ref(), validated).await {
            Ok(order) => order,
            Err(error) => {
                enter(WorkflowStage::PricingFailed);
                return Err(PlaceOrderError::from(error));
            }
        };
        enter(WorkflowStage::Priced);

        let events = to_events(priced);
        enter(WorkflowStage::EventsEmitted);
        Ok(events)
    }
}

#[async_trait]
impl PlaceOrder for PlaceOrderWorkflow {
    async fn place_order(
        &self,
        command: PlaceOrderCommand,
    ) -> Result<Vec<PlaceOrderEvent>, PlaceOrderError> {
        let span = tracing::info_span!(
            "place_order",
            order_id = %command.data.order_id,
            correlation_id = %command.correlation_id,
            user_id = %command.user_id,
        );

        async move {
            let started = Instant::now();
            let result = self.run(command).await;
            let elapsed = started.elapsed().as_secs_f64();

            match &result {
                Ok(events) => {
                    tracing::info!(events = events.len(), "Order placed");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_success(events, elapsed);
                    }
                }
                Err(error) => {
                    tracing::warn!(kind = error.kind(), error = %error, "Order not placed");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_failure(error, elapsed);
                    }
                }
            }

            result
        }
        .instrument(span)
        .await
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
