use std::collections::HashMap;

use super::collaborators::ProductPriceFetcher;
use super::errors::{PriceLookupError, PricingError, PricingErrorKind};
use super::states::{PricedOrder, PricedOrderLine, ValidatedOrder};
use super::value_objects::{Price, ProductCode};

// ============================================================================
// Pricing Step: ValidatedOrder -> PricedOrder
// ============================================================================
//
// Lines are priced in order and the step stops at the first line that
// cannot be priced. Each distinct product code is fetched once per call.
//
// ============================================================================

/// Price every line of a validated order
pub(crate) async fn price_order(
    get_price: &dyn ProductPriceFetcher,
    input: ValidatedOrder,
) -> Result<PricedOrder, PricingError> {
    let (order_id, customer_info, shipping_address, billing_address, lines) = input.into_parts();

    let mut unit_prices: HashMap<ProductCode, Price> = HashMap::new();
    let mut priced_lines = Vec::with_capacity(lines.len());

    for (line_index, line) in lines.into_iter().enumerate() {
        let cached = unit_prices.get(line.product_code()).copied();
        let unit_price = match cached {
            Some(price) => price,
            None => {
                let price = get_price
                    .price_of(line.product_code())
                    .await
                    .map_err(|error| pricing_error(line_index, line.product_code(), error))?;
                unit_prices.insert(line.product_code().clone(), price);
                price
            }
        };

        let product_code = line.product_code().clone();
        let priced_line = PricedOrderLine::new(line, unit_price).ok_or_else(|| {
            tracing::debug!(line_index, product_code = %product_code, "Line price overflow");
            PricingError {
                line_index,
                product_code,
                kind: PricingErrorKind::Overflow,
            }
        })?;
        priced_lines.push(priced_line);
    }

    let priced = PricedOrder::new(
        order_id,
        customer_info,
        shipping_address,
        billing_address,
        priced_lines,
    )
    .map_err(|error| {
        tracing::debug!(error = %error, "Order total overflow");
        error
    })?;

    tracing::debug!(
        order_id = %priced.order_id(),
        amount_to_bill = %priced.amount_to_bill(),
        distinct_products = unit_prices.len(),
        "Order priced"
    );

    Ok(priced)
}

fn pricing_error(
    line_index: usize,
    product_code: &ProductCode,
    error: PriceLookupError,
) -> PricingError {
    tracing::debug!(
        line_index,
        product_code = %product_code,
        error = %error,
        "Price lookup failed"
    );

    let kind = match error {
        PriceLookupError::ProductNotFound(_) => PricingErrorKind::UnknownProduct,
        PriceLookupError::ServiceUnavailable(reason) => PricingErrorKind::LookupFailed(reason),
    };

    PricingError {
        line_index,
        product_code: product_code.clone(),
        kind,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::collaborators::fakes::FakePriceList;
    use crate::domain::order::states::fixtures::validated_order;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn price(cents: i64) -> Price {
        Price::new(Decimal::new(cents, 2)).unwrap()
    }

    #[tokio::test]
    async fn test_total_is_sum_of_line_prices() {
        let prices = FakePriceList::default()
            .with_price("P1", price(1000))
            .with_price("P2", price(250));

        let priced = price_order(&prices, validated_order("O1", &[("P1", 2), ("P2", 3)]))
            .await
            .unwrap();

        assert_eq!(priced.lines()[0].line_price(), price(2000));
        assert_eq!(priced.lines()[1].line_price(), price(750));
        assert_eq!(priced.amount_to_bill().value(), Decimal::new(2750, 2));
    }

    #[tokio::test]
    async fn test_each_distinct_code_is_fetched_once() {
        let prices = FakePriceList::default().with_price("P1", price(100));

        let priced = price_order(&prices, validated_order("O1", &[("P1", 1), ("P1", 4)]))
            .await
            .unwrap();

        assert_eq!(prices.call_count(), 1);
        assert_eq!(priced.amount_to_bill().value(), Decimal::new(500, 2));
    }

    #[tokio::test]
    async fn test_first_unpriceable_line_stops_pricing() {
        let prices = FakePriceList::default()
            .with_price("P1", price(100))
            .with_price("P3", price(100));

        let order = validated_order("O1", &[("P1", 1), ("P2", 1), ("P3", 1), ("P4", 1)]);
        let error = price_order(&prices, order).await.unwrap_err();

        assert_eq!(error.line_index, 1);
        assert_eq!(error.product_code.as_str(), "P2");
        assert_eq!(error.kind, PricingErrorKind::UnknownProduct);
        assert_eq!(
            *prices.requested.lock().unwrap(),
            vec!["P1".to_string(), "P2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_service_failure_is_lookup_failed() {
        let prices = FakePriceList::default()
            .with_failure("P1", PriceLookupError::ServiceUnavailable("503".to_string()));

        let error = price_order(&prices, validated_order("O1", &[("P1", 1)]))
            .await
            .unwrap_err();

        assert_eq!(error.kind, PricingErrorKind::LookupFailed("503".to_string()));
    }

    #[tokio::test]
    async fn test_free_products_give_zero_total() {
        let prices = FakePriceList::default().with_price("FREE", Price::zero());

        let priced = price_order(&prices, validated_order("O1", &[("FREE", 3)]))
            .await
            .unwrap();

        assert!(!priced.amount_to_bill().is_positive());
    }

    #[tokio::test]
    async fn test_line_price_overflow_is_a_pricing_error() {
        let prices = FakePriceList::default()
            .with_price("P1", price(100))
            .with_price("BIG", Price::new(Decimal::MAX).unwrap());

        let error = price_order(&prices, validated_order("O1", &[("P1", 1), ("BIG", 2)]))
            .await
            .unwrap_err();

        assert_eq!(error.line_index, 1);
        assert_eq!(error.product_code.as_str(), "BIG");
        assert_eq!(error.kind, PricingErrorKind::Overflow);
    }

    #[tokio::test]
    async fn test_total_overflow_points_at_offending_line() {
        let max = Price::new(Decimal::MAX).unwrap();
        let prices = FakePriceList::default()
            .with_price("P1", max)
            .with_price("P2", max);

        let error = price_order(&prices, validated_order("O1", &[("P1", 1), ("P2", 1)]))
            .await
            .unwrap_err();

        assert_eq!(error.line_index, 1);
        assert_eq!(error.product_code.as_str(), "P2");
        assert_eq!(error.kind, PricingErrorKind::Overflow);
    }

    proptest! {
        #[test]
        fn prop_total_matches_exact_sum(
            lines in proptest::collection::vec((0usize..5, 1i32..50, 0i64..100_000), 1..8),
        ) {
            // one price per code: the first price generated for a code wins
            let mut price_list = FakePriceList::default();
            let mut unit_by_code: HashMap<String, i64> = HashMap::new();
            let mut specs = Vec::new();
            for (code, quantity, cents) in &lines {
                let code = format!("P{}", code);
                let cents = *unit_by_code.entry(code.clone()).or_insert(*cents);
                specs.push((code, *quantity, cents));
            }
            for (code, cents) in &unit_by_code {
                price_list = price_list.with_price(code, price(*cents));
            }

            let expected: Decimal = specs
                .iter()
                .map(|(_, quantity, cents)| Decimal::new(*cents, 2) * Decimal::from(*quantity))
                .sum();

            let order_lines: Vec<(&str, i32)> =
                specs.iter().map(|(c, q, _)| (c.as_str(), *q)).collect();
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let priced = runtime
                .block_on(price_order(&price_list, validated_order("O1", &order_lines)))
                .unwrap();

            prop_assert_eq!(priced.amount_to_bill().value(), expected);
        }
    }
}
