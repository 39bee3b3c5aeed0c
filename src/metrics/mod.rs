use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::domain::order::{PlaceOrderError, PlaceOrderEvent, PricingErrorKind, ValidationError};

// ============================================================================
// Metrics Module - Prometheus metrics for the place-order workflow
// ============================================================================
//
// Tracks:
// - Orders placed and rejected (per failure kind)
// - Events emitted per event type
// - End-to-end workflow latency
// - Price service circuit breaker state
//
// Exposition is left to the host process; `render` produces the text format.
// ============================================================================

pub struct WorkflowMetrics {
    registry: Registry,

    pub orders_placed: IntCounter,
    pub validation_failures: IntCounterVec,
    pub pricing_failures: IntCounterVec,
    pub events_emitted: IntCounterVec,
    pub place_order_duration: HistogramVec,
    pub price_circuit_state: IntGauge,
}

impl WorkflowMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let orders_placed =
            IntCounter::new("orders_placed_total", "Orders that completed the workflow")?;
        registry.register(Box::new(orders_placed.clone()))?;

        let validation_failures = IntCounterVec::new(
            Opts::new("order_validation_failures_total", "Validation errors by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(validation_failures.clone()))?;

        let pricing_failures = IntCounterVec::new(
            Opts::new("order_pricing_failures_total", "Orders that could not be priced"),
            &["kind"],
        )?;
        registry.register(Box::new(pricing_failures.clone()))?;

        let events_emitted = IntCounterVec::new(
            Opts::new("order_events_emitted_total", "Events emitted by event type"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_emitted.clone()))?;

        let place_order_duration = HistogramVec::new(
            HistogramOpts::new("place_order_duration_seconds", "Place order workflow duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["outcome"],
        )?;
        registry.register(Box::new(place_order_duration.clone()))?;

        let price_circuit_state = IntGauge::new(
            "price_circuit_state",
            "Price service circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(price_circuit_state.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            validation_failures,
            pricing_failures,
            events_emitted,
            place_order_duration,
            price_circuit_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_success(&self, events: &[PlaceOrderEvent], duration_secs: f64) {
        self.orders_placed.inc();
        for event in events {
            self.events_emitted.with_label_values(&[event.event_type()]).inc();
        }
        self.place_order_duration.with_label_values(&["placed"]).observe(duration_secs);
    }

    pub fn record_failure(&self, error: &PlaceOrderError, duration_secs: f64) {
        match error {
            PlaceOrderError::Validation(errors) => {
                for error in errors.iter() {
                    self.validation_failures.with_label_values(&[validation_kind(error)]).inc();
                }
            }
            PlaceOrderError::Pricing(error) => {
                let kind = match error.kind {
                    PricingErrorKind::UnknownProduct => "unknown_product",
                    PricingErrorKind::LookupFailed(_) => "lookup_failed",
                    PricingErrorKind::Overflow => "overflow",
                };
                self.pricing_failures.with_label_values(&[kind]).inc();
            }
        }
        self.place_order_duration.with_label_values(&[error.kind()]).observe(duration_secs);
    }

    pub fn update_price_circuit_state(&self, gauge: i64) {
        self.price_circuit_state.set(gauge);
    }

    /// Prometheus text exposition of every registered metric
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

fn validation_kind(error: &ValidationError) -> &'static str {
    match error {
        ValidationError::MissingOrderId | ValidationError::InvalidOrderId(_) => "order_id",
        ValidationError::InvalidCustomerInfo(_) => "customer_info",
        ValidationError::EmptyOrder => "empty_order",
        ValidationError::InvalidProductCode { .. } => "invalid_product_code",
        ValidationError::UnknownProductCode { .. } => "unknown_product_code",
        ValidationError::NonPositiveQuantity { .. } => "quantity",
        ValidationError::InvalidAddress { .. } => "address",
        ValidationError::AddressCheckFailed { .. } => "address_service",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{PricingError, ProductCode, ValidationErrors};

    #[test]
    fn test_metrics_creation() {
        let metrics = WorkflowMetrics::new().unwrap();
        metrics.orders_placed.inc();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_validation_failures_are_counted_per_error() {
        let metrics = WorkflowMetrics::new().unwrap();
        let errors = ValidationErrors::from_vec(vec![
            ValidationError::MissingOrderId,
            ValidationError::EmptyOrder,
            ValidationError::EmptyOrder,
        ])
        .unwrap();

        metrics.record_failure(&PlaceOrderError::Validation(errors), 0.01);

        assert_eq!(metrics.validation_failures.with_label_values(&["empty_order"]).get(), 2);
        assert_eq!(metrics.validation_failures.with_label_values(&["order_id"]).get(), 1);
    }

    #[test]
    fn test_pricing_failure_is_counted() {
        let metrics = WorkflowMetrics::new().unwrap();
        let error = PricingError {
            line_index: 0,
            product_code: ProductCode::parse("P1").unwrap(),
            kind: PricingErrorKind::UnknownProduct,
        };

        metrics.record_failure(&PlaceOrderError::Pricing(error), 0.01);

        assert_eq!(metrics.pricing_failures.with_label_values(&["unknown_product"]).get(), 1);
        let text = metrics.render().unwrap();
        assert!(text.contains("order_pricing_failures_total{kind=\"unknown_product\"} 1"));
        assert!(text.contains("place_order_duration_seconds_count{outcome=\"pricing\"} 1"));
    }

    #[test]
    fn test_overflow_is_its_own_pricing_kind() {
        let metrics = WorkflowMetrics::new().unwrap();
        let error = PricingError {
            line_index: 1,
            product_code: ProductCode::parse("P2").unwrap(),
            kind: PricingErrorKind::Overflow,
        };

        metrics.record_failure(&PlaceOrderError::Pricing(error), 0.01);

        assert_eq!(metrics.pricing_failures.with_label_values(&["overflow"]).get(), 1);
    }

    #[test]
    fn test_circuit_state_gauge() {
        let metrics = WorkflowMetrics::new().unwrap();
        metrics.update_price_circuit_state(1);
        assert_eq!(metrics.price_circuit_state.get(), 1);
    }
}
