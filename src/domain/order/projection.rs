use super::acknowledgment::render_acknowledgment;
use super::events::{BillableOrderPlaced, OrderAcknowledgmentSent, PlaceOrderEvent};
use super::states::PricedOrder;

// ============================================================================
// Event Projection: PricedOrder -> [PlaceOrderEvent]
// ============================================================================
//
// Consumers rely on this order:
//   1. OrderPlaced
//   2. BillableOrderPlaced (only when there is something to bill)
//   3. OrderAcknowledgmentSent
//
// ============================================================================

pub(crate) fn to_events(order: PricedOrder) -> Vec<PlaceOrderEvent> {
    let billable = order.amount_to_bill().is_positive().then(|| BillableOrderPlaced {
        order_id: order.order_id().clone(),
        billing_address: order.billing_address().clone(),
        amount_to_bill: order.amount_to_bill(),
    });

    let acknowledgment = OrderAcknowledgmentSent {
        order_id: order.order_id().clone(),
        email_address: order.customer_info().email_address.clone(),
        letter: render_acknowledgment(&order),
    };

    let mut events = Vec::with_capacity(3);
    events.push(PlaceOrderEvent::OrderPlaced(order));
    events.extend(billable.map(PlaceOrderEvent::BillableOrderPlaced));
    events.push(PlaceOrderEvent::OrderAcknowledgmentSent(acknowledgment));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::states::fixtures::priced_order;
    use rust_decimal::Decimal;

    fn priced(unit_cents: i64) -> PricedOrder {
        priced_order("O1", &[("P1", 2)], unit_cents)
    }

    fn event_types(events: &[PlaceOrderEvent]) -> Vec<&'static str> {
        events.iter().map(PlaceOrderEvent::event_type).collect()
    }

    #[test]
    fn test_paid_order_emits_three_events_in_order() {
        let events = to_events(priced(1000));

        assert_eq!(
            event_types(&events),
            vec!["OrderPlaced", "BillableOrderPlaced", "OrderAcknowledgmentSent"]
        );
        match &events[1] {
            PlaceOrderEvent::BillableOrderPlaced(billable) => {
                assert_eq!(billable.amount_to_bill.value(), Decimal::new(2000, 2));
                assert_eq!(billable.billing_address.state, "IL");
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_free_order_is_not_billed() {
        let events = to_events(priced(0));

        assert_eq!(event_types(&events), vec!["OrderPlaced", "OrderAcknowledgmentSent"]);
    }

    #[test]
    fn test_acknowledgment_goes_to_customer_email() {
        let events = to_events(priced(1000));

        match events.last() {
            Some(PlaceOrderEvent::OrderAcknowledgmentSent(ack)) => {
                assert_eq!(ack.email_address.as_str(), "ada@example.com");
                assert!(ack.letter.as_str().contains("Total: 20.00"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
