// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each workflow has its own subdirectory with its value objects, states,
// events, errors, collaborator ports and the steps that connect them.
//
// This layer knows nothing about concrete collaborators; adapters live in
// `crate::adapters`.
//
// ============================================================================

pub mod order;
