//! # Catalog
//!
//! Products and customers fetched once when a terminal starts.
//!
//! A failed fetch leaves that list empty and the cart usable; scans then
//! miss with `ProductNotFound` until the next load.

use oud_core::{CoreError, CoreResult, Customer, Product};
use tracing::{info, warn};

use crate::backend::SalesBackend;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
    customers: Vec<Customer>,
}

impl Catalog {
    pub fn new(products: Vec<Product>, customers: Vec<Customer>) -> Self {
        Catalog { products, customers }
    }

    pub fn empty() -> Self {
        Catalog::default()
    }

    /// Fetches both lists. Never fails; see the module docs.
    pub async fn load(backend: &dyn SalesBackend) -> Self {
        let products = match backend.fetch_products().await {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, "Product fetch failed, starting with an empty catalog");
                Vec::new()
            }
        };

        let customers = match backend.fetch_customers().await {
            Ok(customers) => customers,
            Err(e) => {
                warn!(error = %e, "Customer fetch failed, starting without customers");
                Vec::new()
            }
        };

        info!(products = products.len(), customers = customers.len(), "Catalog loaded");
        Catalog { products, customers }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn find_product(&self, id: &str) -> CoreResult<&Product> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))
    }

    /// Exact barcode match first, then SKU ignoring case.
    pub fn find_by_code(&self, code: &str) -> CoreResult<&Product> {
        let code = code.trim();

        self.products
            .iter()
            .find(|p| p.barcode.as_deref() == Some(code))
            .or_else(|| {
                self.products
                    .iter()
                    .find(|p| p.sku.as_deref().is_some_and(|sku| sku.eq_ignore_ascii_case(code)))
            })
            .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))
    }

    /// Case-insensitive substring match on names, SKU and brand.
    pub fn search(&self, query: &str) -> Vec<&Product> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.products.iter().collect();
        }

        self.products
            .iter()
            .filter(|p| {
                [Some(p.name.as_str()), p.name_ar.as_deref(), p.sku.as_deref(), p.brand.as_deref()]
                    .into_iter()
                    .flatten()
                    .any(|field| field.to_lowercase().contains(&query))
            })
            .collect()
    }

    pub fn find_customer(&self, id: &str) -> CoreResult<&Customer> {
        self.customers
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::CustomerNotFound(id.to_string()))
    }

    /// Name (case-insensitive) or phone substring.
    pub fn search_customers(&self, query: &str) -> Vec<&Customer> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        self.customers
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&query)
                    || c.phone.as_deref().is_some_and(|phone| phone.contains(&query))
            })
            .collect()
    }
}
