//! Product catalog service.

use chrono::Utc;
use record_store::{Filter, RecordStore};

use crate::account::Role;
use crate::actor::Actor;
use crate::document::Document;
use crate::error::DomainError;
use crate::repository::Repository;
use crate::value_objects::ProductId;

use super::{CreateProduct, DEFAULT_CATEGORY, Product, ProductQuery, UpdateProduct};

/// Service for managing the product catalog.
pub struct ProductService<S: RecordStore> {
    repo: Repository<S>,
}

impl<S: RecordStore> ProductService<S> {
    /// Creates a new product service over the given repository.
    pub fn new(repo: Repository<S>) -> Self {
        Self { repo }
    }

    /// Lists a new product owned by the acting supplier.
    #[tracing::instrument(skip(self, cmd), fields(supplier_id = %actor.id))]
    pub async fn create_product(
        &self,
        actor: Actor,
        cmd: CreateProduct,
    ) -> Result<Product, DomainError> {
        actor.require(Role::Supplier)?;

        let name = cmd.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::InvalidArgument(
                "product name is required".to_string(),
            ));
        }
        if cmd.price.is_negative() {
            return Err(DomainError::InvalidArgument(
                "price cannot be negative".to_string(),
            ));
        }

        let category = cmd
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let now = Utc::now();
        let mut product = Product {
            id: ProductId::new(),
            supplier_id: actor.id,
            name,
            description: cmd.description,
            category,
            price: cmd.price,
            quantity: cmd.quantity,
            available: true,
            created_at: now,
            updated_at: now,
            version: Default::default(),
        };

        let records = self.repo.commit(product.insert_write()?.into()).await?;
        product.set_version(records[0].version);

        tracing::info!(product_id = %product.id, quantity = product.quantity, "product listed");
        Ok(product)
    }

    /// Loads a product by ID.
    pub async fn get(&self, id: ProductId) -> Result<Product, DomainError> {
        self.repo.require(id).await
    }

    /// Lists products matching the query, oldest first.
    pub async fn list(&self, query: ProductQuery) -> Result<Vec<Product>, DomainError> {
        let mut filter = Filter::new();
        if let Some(supplier_id) = query.supplier_id {
            filter = filter.eq("supplier_id", supplier_id.to_string());
        }
        if let Some(category) = query.category.filter(|c| !c.trim().is_empty()) {
            filter = filter.eq("category", category.trim());
        }

        let products = self.repo.find::<Product>(filter).await?;

        Ok(match query.search.map(|s| s.trim().to_lowercase()) {
            Some(needle) if !needle.is_empty() => products
                .into_iter()
                .filter(|p| p.mentions(&needle))
                .collect(),
            _ => products,
        })
    }

    /// Applies a partial update to a product the acting supplier owns.
    #[tracing::instrument(skip(self, update), fields(supplier_id = %actor.id))]
    pub async fn update_product(
        &self,
        actor: Actor,
        id: ProductId,
        update: UpdateProduct,
    ) -> Result<Product, DomainError> {
        actor.require(Role::Supplier)?;

        if let Some(name) = &update.name
            && name.trim().is_empty()
        {
            return Err(DomainError::InvalidArgument(
                "product name cannot be blank".to_string(),
            ));
        }
        if update.price.is_some_and(|p| p.is_negative()) {
            return Err(DomainError::InvalidArgument(
                "price cannot be negative".to_string(),
            ));
        }

        self.repo
            .with_retry("update_product", || {
                let update = update.clone();
                async move {
                    let mut product: Product = self.repo.require(id).await?;
                    if !product.is_owned_by(actor.id) {
                        return Err(DomainError::PermissionDenied(format!(
                            "product {id} belongs to another supplier"
                        )));
                    }
                    if update.is_empty() {
                        return Ok(product);
                    }

                    if let Some(name) = update.name {
                        product.name = name.trim().to_string();
                    }
                    if let Some(description) = update.description {
                        product.description = description;
                    }
                    if let Some(category) = update.category {
                        let category = category.trim();
                        product.category = if category.is_empty() {
                            DEFAULT_CATEGORY.to_string()
                        } else {
                            category.to_string()
                        };
                    }
                    if let Some(price) = update.price {
                        product.price = price;
                    }
                    if let Some(quantity) = update.quantity {
                        product.quantity = quantity;
                    }
                    if let Some(available) = update.available {
                        product.available = available;
                    }
                    product.updated_at = Utc::now();

                    let records = self.repo.commit(product.update_write()?.into()).await?;
                    product.set_version(records[0].version);
                    Ok(product)
                }
            })
            .await
    }
}
