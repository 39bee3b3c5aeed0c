use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

use crate::domain::order::{
    AddressCheckError, AddressChecker, ConfirmedAddress, Price, PriceLookupError, ProductCode,
    ProductCodeChecker, ProductPriceFetcher, UnvalidatedAddress,
};

/// Product catalog held in memory. Serves both existence checks and prices.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    prices: HashMap<ProductCode, Price>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, code: ProductCode, price: Price) -> Self {
        self.prices.insert(code, price);
        self
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(ProductCode, Price)> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = (ProductCode, Price)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ProductCodeChecker for InMemoryCatalog {
    async fn exists(&self, code: &ProductCode) -> bool {
        self.prices.contains_key(code)
    }
}

#[async_trait]
impl ProductPriceFetcher for InMemoryCatalog {
    async fn price_of(&self, code: &ProductCode) -> Result<Price, PriceLookupError> {
        self.prices
            .get(code)
            .copied()
            .ok_or_else(|| PriceLookupError::ProductNotFound(code.clone()))
    }
}

/// Address verification against a fixed set of deliverable zip codes.
///
/// Confirmed addresses are normalized: fields trimmed, state and country
/// upper-cased, an empty second line dropped.
#[derive(Debug, Clone, Default)]
pub struct AddressDirectory {
    deliverable_zips: HashSet<String>,
}

impl AddressDirectory {
    pub fn new<I, S>(deliverable_zips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deliverable_zips: deliverable_zips.into_iter().map(Into::into).collect(),
        }
    }
}

fn required(field: &str, value: &str) -> Result<String, AddressCheckError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressCheckError::InvalidFormat(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[async_trait]
impl AddressChecker for AddressDirectory {
    async fn verify(
        &self,
        address: &UnvalidatedAddress,
    ) -> Result<ConfirmedAddress, AddressCheckError> {
        let address_line1 = required("address line 1", &address.address_line1)?;
        let city = required("city", &address.city)?;
        let zip_code = required("zip code", &address.zip_code)?;
        let country = required("country", &address.country)?.to_uppercase();

        if !zip_code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(AddressCheckError::InvalidFormat(format!(
                "zip code '{}' contains invalid characters",
                zip_code
            )));
        }
        if !self.deliverable_zips.contains(&zip_code) {
            return Err(AddressCheckError::AddressNotFound);
        }

        let address_line2 = Some(address.address_line2.trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string);

        Ok(ConfirmedAddress {
            address_line1,
            address_line2,
            city,
            zip_code,
            state: address.state.trim().to_uppercase(),
            country,
        })
    }
}
