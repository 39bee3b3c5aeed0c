// ============================================================================
// Order Domain - Place Order Workflow
// ============================================================================
//
// This module contains ALL order-placement code:
// - Value objects (OrderId, ProductCode, Price, ConfirmedAddress, ...)
// - Order states (Unvalidated -> Validated -> Priced)
// - Commands (Command envelope, PlaceOrderCommand)
// - Errors (ValidationErrors, PricingError, PlaceOrderError)
// - Collaborator ports (product, address and price lookups)
// - Workflow steps (validation, pricing, acknowledgment, projection)
// - Workflow (PlaceOrderWorkflow orchestrating the steps)
//
// Steps are crate-private async functions over their collaborators; the
// workflow binds the collaborators once and is the only public entry point.
//
// ============================================================================

pub mod value_objects;
pub mod states;
pub mod commands;
pub mod events;
pub mod errors;
pub mod collaborators;
pub mod acknowledgment;
pub mod workflow;

// Steps are reachable only through `PlaceOrder`
mod validation;
mod pricing;
mod projection;

// Re-export for convenience
pub use value_objects::*;
pub use states::*;
pub use commands::*;
pub use events::*;
pub use errors::*;
pub use collaborators::*;
pub use acknowledgment::AcknowledgmentLetter;
pub use workflow::*;
