use serde::Serialize;

use super::acknowledgment::AcknowledgmentLetter;
use super::states::PricedOrder;
use super::value_objects::{BillingAmount, ConfirmedAddress, EmailAddress, OrderId};

// ============================================================================
// Place Order Events - Output of a successful workflow run
// ============================================================================

/// Place order event - union type for all workflow outputs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum PlaceOrderEvent {
    OrderPlaced(PricedOrder),
    BillableOrderPlaced(BillableOrderPlaced),
    OrderAcknowledgmentSent(OrderAcknowledgmentSent),
}

impl PlaceOrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            PlaceOrderEvent::OrderPlaced(_) => "OrderPlaced",
            PlaceOrderEvent::BillableOrderPlaced(_) => "BillableOrderPlaced",
            PlaceOrderEvent::OrderAcknowledgmentSent(_) => "OrderAcknowledgmentSent",
        }
    }

    pub fn order_id(&self) -> &OrderId {
        match self {
            PlaceOrderEvent::OrderPlaced(order) => order.order_id(),
            PlaceOrderEvent::BillableOrderPlaced(e) => &e.order_id,
            PlaceOrderEvent::OrderAcknowledgmentSent(e) => &e.order_id,
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Billable Order Placed - billing-relevant subset of a priced order
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BillableOrderPlaced {
    pub order_id: OrderId,
    pub billing_address: ConfirmedAddress,
    pub amount_to_bill: BillingAmount,
}

/// Order Acknowledgment Sent - the acknowledgment addressed to the customer
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct OrderAcknowledgmentSent {
    pub order_id: OrderId,
    pub email_address: EmailAddress,
    pub letter: AcknowledgmentLetter,
}
