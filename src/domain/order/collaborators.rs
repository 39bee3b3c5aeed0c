use async_trait::async_trait;
use std::sync::Arc;

use super::errors::{AddressCheckError, PriceLookupError};
use super::states::UnvalidatedAddress;
use super::value_objects::{ConfirmedAddress, Price, ProductCode};

// ============================================================================
// Collaborator Ports
// ============================================================================
//
// Capabilities the workflow consumes but does not implement. Steps receive
// them as explicit arguments; the public workflow binds them once at startup.
//
// ============================================================================

/// Product catalog existence check
#[async_trait]
pub trait ProductCodeChecker: Send + Sync {
    async fn exists(&self, code: &ProductCode) -> bool;
}

/// Address verification service
#[async_trait]
pub trait AddressChecker: Send + Sync {
    async fn verify(
        &self,
        address: &UnvalidatedAddress,
    ) -> Result<ConfirmedAddress, AddressCheckError>;
}

/// Price lookup service
#[async_trait]
pub trait ProductPriceFetcher: Send + Sync {
    async fn price_of(&self, code: &ProductCode) -> Result<Price, PriceLookupError>;
}

#[async_trait]
impl<T: ProductCodeChecker + ?Sized> ProductCodeChecker for Arc<T> {
    async fn exists(&self, code: &ProductCode) -> bool {
        (**self).exists(code).await
    }
}

#[async_trait]
impl<T: AddressChecker + ?Sized> AddressChecker for Arc<T> {
    async fn verify(
        &self,
        address: &UnvalidatedAddress,
    ) -> Result<ConfirmedAddress, AddressCheckError> {
        (**self).verify(address).await
    }
}

#[async_trait]
impl<T: ProductPriceFetcher + ?Sized> ProductPriceFetcher for Arc<T> {
    async fn price_of(&self, code: &ProductCode) -> Result<Price, PriceLookupError> {
        (**self).price_of(code).await
    }
}

// ============================================================================
// Test doubles shared by the workflow tests
// ============================================================================
