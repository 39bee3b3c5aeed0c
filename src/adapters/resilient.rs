use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::order::{
    AddressCheckError, AddressChecker, ConfirmedAddress, Price, PriceLookupError, ProductCode,
    ProductPriceFetcher, UnvalidatedAddress,
};
use crate::metrics::WorkflowMetrics;
use crate::utils::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, IsTransient,
    RetryConfig,
};

// ============================================================================
// Resilience Wrappers
// ============================================================================
//
// Retry and circuit breaking live outside the workflow. Each wrapper is
// itself a collaborator, so the workflow never knows it is there.
//
// - RetryingAddressChecker: exponential backoff on transient address errors
// - GuardedPriceFetcher: per-call timeout + circuit breaker on the price service
//
// ============================================================================

pub struct RetryingAddressChecker<C> {
    inner: C,
    config: RetryConfig,
}

impl<C: AddressChecker> RetryingAddressChecker<C> {
    pub fn new(inner: C, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<C: AddressChecker> AddressChecker for RetryingAddressChecker<C> {
    async fn verify(
        &self,
        address: &UnvalidatedAddress,
    ) -> Result<ConfirmedAddress, AddressCheckError> {
        retry_on_transient(&self.config, "address_check", |_attempt| {
            self.inner.verify(address)
        })
        .await
    }
}

pub struct GuardedPriceFetcher<F> {
    inner: F,
    circuit_breaker: CircuitBreaker,
    timeout: Duration,
    metrics: Option<Arc<WorkflowMetrics>>,
}

impl<F: ProductPriceFetcher> GuardedPriceFetcher<F> {
    pub fn new(inner: F, circuit: CircuitBreakerConfig, timeout: Duration) -> Self {
        Self {
            inner,
            circuit_breaker: CircuitBreaker::new("price_service", circuit),
            timeout,
            metrics: None,
        }
    }

    /// Publish circuit state changes to the given metrics
    pub fn with_metrics(mut self, metrics: Arc<WorkflowMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn circuit_state(&self) -> crate::utils::CircuitState {
        self.circuit_breaker.state().await
    }
}

#[async_trait]
impl<F: ProductPriceFetcher> ProductPriceFetcher for GuardedPriceFetcher<F> {
    async fn price_of(&self, code: &ProductCode) -> Result<Price, PriceLookupError> {
        // Only service failures count against the circuit; an unknown product is an answer.
        let result = self
            .circuit_breaker
            .call(async {
                match tokio::time::timeout(self.timeout, self.inner.price_of(code)).await {
                    Ok(Err(error)) if error.is_transient() => Err(error),
                    Ok(answer) => Ok(answer),
                    Err(_) => Err(PriceLookupError::ServiceUnavailable(format!(
                        "price lookup timed out after {}ms",
                        self.timeout.as_millis()
                    ))),
                }
            })
            .await;

        if let Some(metrics) = &self.metrics {
            metrics.update_price_circuit_state(self.circuit_breaker.state().await.as_gauge());
        }

        match result {
            Ok(answer) => answer,
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::error!(
                    product_code = %code,
                    "Circuit breaker open - price service unavailable"
                );
                Err(PriceLookupError::ServiceUnavailable("circuit breaker open".to_string()))
            }
            Err(CircuitBreakerError::OperationFailed(error)) => {
                tracing::error!(product_code = %code, error = %error, "Price lookup failed");
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::states::fixtures::{confirmed_address, unvalidated_address};
    use crate::utils::CircuitState;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with `error` for the first `failures` calls, then succeeds
    struct Flaky<E> {
        failures: u32,
        error: E,
        calls: AtomicU32,
        delay: Duration,
    }

    impl<E> Flaky<E> {
        fn new(failures: u32, error: E) -> Self {
            Self {
                failures,
                error,
                calls: AtomicU32::new(0),
                delay: Duration::ZERO,
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        async fn next(&self) -> bool {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            call >= self.failures
        }
    }

    #[async_trait]
    impl AddressChecker for Flaky<AddressCheckError> {
        async fn verify(
            &self,
            _address: &UnvalidatedAddress,
        ) -> Result<ConfirmedAddress, AddressCheckError> {
            if self.next().await {
                Ok(confirmed_address())
            } else {
                Err(self.error.clone())
            }
        }
    }

    #[async_trait]
    impl ProductPriceFetcher for Flaky<PriceLookupError> {
        async fn price_of(&self, _code: &ProductCode) -> Result<Price, PriceLookupError> {
            if self.next().await {
                Ok(Price::new(Decimal::new(500, 2)).unwrap())
            } else {
                Err(self.error.clone())
            }
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    fn circuit(failure_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            open_timeout: Duration::from_secs(60),
            success_threshold: 1,
        }
    }

    fn p1() -> ProductCode {
        ProductCode::parse("P1").unwrap()
    }

    #[tokio::test]
    async fn test_address_timeouts_are_retried() {
        let checker =
            RetryingAddressChecker::new(Flaky::new(2, AddressCheckError::Timeout), fast_retry(3));

        assert_eq!(checker.verify(&unvalidated_address()).await, Ok(confirmed_address()));
        assert_eq!(checker.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_address_is_not_retried() {
        let checker = RetryingAddressChecker::new(
            Flaky::new(5, AddressCheckError::AddressNotFound),
            fast_retry(3),
        );

        assert_eq!(
            checker.verify(&unvalidated_address()).await,
            Err(AddressCheckError::AddressNotFound)
        );
        assert_eq!(checker.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_price_lookup_times_out() {
        let fetcher = GuardedPriceFetcher::new(
            Flaky::new(0, PriceLookupError::ServiceUnavailable("down".to_string()))
                .slow(Duration::from_millis(200)),
            circuit(5),
            Duration::from_millis(10),
        );

        let result = fetcher.price_of(&p1()).await;
        assert!(matches!(result, Err(PriceLookupError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_open_circuit_short_circuits_lookups() {
        let metrics = Arc::new(WorkflowMetrics::new().unwrap());
        let fetcher = GuardedPriceFetcher::new(
            Flaky::new(10, PriceLookupError::ServiceUnavailable("down".to_string())),
            circuit(2),
            Duration::from_secs(1),
        )
        .with_metrics(metrics.clone());

        for _ in 0..3 {
            let result = fetcher.price_of(&p1()).await;
            assert!(matches!(result, Err(PriceLookupError::ServiceUnavailable(_))));
        }

        assert_eq!(fetcher.circuit_state().await, CircuitState::Open);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(metrics.price_circuit_state.get(), CircuitState::Open.as_gauge());
    }

    #[tokio::test]
    async fn test_unknown_products_do_not_trip_circuit() {
        let fetcher = GuardedPriceFetcher::new(
            Flaky::new(10, PriceLookupError::ProductNotFound(p1())),
            circuit(2),
            Duration::from_secs(1),
        );

        for _ in 0..3 {
            assert_eq!(
                fetcher.price_of(&p1()).await,
                Err(PriceLookupError::ProductNotFound(p1()))
            );
        }

        assert_eq!(fetcher.circuit_state().await, CircuitState::Closed);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }
}
