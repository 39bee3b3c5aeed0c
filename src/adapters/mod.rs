// ============================================================================
// Adapters - Concrete Collaborators
// ============================================================================
//
// - in_memory: catalog and address directory backed by local data
// - resilient: retry and circuit breaker wrappers around any collaborator
//
// The workflow only sees the collaborator traits; these types are wired in
// at startup.
//
// ============================================================================

pub mod in_memory;
pub mod resilient;

pub use in_memory::{AddressDirectory, InMemoryCatalog};
pub use resilient::{GuardedPriceFetcher, RetryingAddressChecker};
