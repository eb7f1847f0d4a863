//! Catalog browsing and administration

use std::collections::HashMap;

use shared::{CategoryId, ProductId};

use crate::core::catalog::{self, ProductFilter, ProductQuery};
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;
use crate::types::{
    Category, CategoryDraft, CategoryPayload, Page, Product, ProductDetail, ProductDraft, ProductPatch, ProductPayload,
};

const COMPONENT: &str = "catalog";

const RELATED_LIMIT: usize = 4;

fn required_name(name: &str) -> StorefrontResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorefrontError::invalid("name must not be empty"));
    }
    Ok(name.to_string())
}

/// Explicit slug if given, otherwise derived from the name
fn slug_for(name: &str, slug: Option<&str>) -> StorefrontResult<String> {
    let slug = catalog::slugify(slug.filter(|s| !s.trim().is_empty()).unwrap_or(name));
    if slug.is_empty() {
        return Err(StorefrontError::invalid(format!("cannot derive a slug from {name:?}")));
    }
    Ok(slug)
}

fn product_draft(payload: ProductPayload) -> StorefrontResult<ProductDraft> {
    let name = required_name(&payload.name)?;
    if payload.price.is_zero() {
        return Err(StorefrontError::invalid("price must be greater than zero"));
    }
    Ok(ProductDraft {
        category_id: payload.category_id,
        slug: slug_for(&name, payload.slug.as_deref())?,
        name,
        description: payload.description.trim().to_string(),
        price: payload.price,
        stock: payload.stock,
        active: payload.active,
    })
}

impl Storefront {
    pub async fn categories(&self) -> StorefrontResult<Vec<Category>> {
        let mut categories = self.store.categories().await?;
        categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(categories)
    }

    /// Category by slug or numeric id
    async fn resolve_category(&self, key: &str) -> StorefrontResult<Option<Category>> {
        let categories = self.store.categories().await?;
        let by_id = key.parse::<u64>().ok().map(CategoryId);
        Ok(categories
            .into_iter()
            .find(|category| category.slug == key || Some(category.id) == by_id))
    }

    /// Filtered, sorted page of products; inactive ones only when `include_inactive`
    pub async fn list_products(&self, query: &ProductQuery, include_inactive: bool) -> StorefrontResult<Page<Product>> {
        let category_id = match query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(key) => match self.resolve_category(key).await? {
                Some(category) => Some(category.id),
                // Unknown category matches nothing
                None => return Ok(catalog::paginate(Vec::new(), query.page, query.page_size)),
            },
            None => None,
        };

        let filter = ProductFilter::from_query(query, category_id, include_inactive);
        let products = self.store.products().await?;
        Ok(catalog::list_products(products, &filter, query))
    }

    /// Storefront product page by id or slug
    pub async fn product_detail(&self, id_or_slug: &str) -> StorefrontResult<ProductDetail> {
        let products = self.store.products().await?;
        let by_id = id_or_slug.parse::<u64>().ok().map(ProductId);
        let product = products
            .iter()
            .find(|p| Some(p.id) == by_id || p.slug == id_or_slug)
            .filter(|p| p.active)
            .cloned()
            .ok_or_else(|| StorefrontError::not_found("product", id_or_slug))?;

        let category = self
            .store
            .categories()
            .await?
            .into_iter()
            .find(|c| c.id == product.category_id);
        let related = catalog::related_products(&product, &products, RELATED_LIMIT);

        Ok(ProductDetail {
            product,
            category,
            related,
        })
    }

    /// Active products by id, for repricing carts
    pub(crate) async fn catalog_index(&self) -> StorefrontResult<HashMap<ProductId, Product>> {
        Ok(self
            .store
            .products()
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect())
    }

    pub async fn create_category(&self, payload: CategoryPayload) -> StorefrontResult<Category> {
        let name = required_name(&payload.name)?;
        let category = self
            .store
            .insert_category(CategoryDraft {
                slug: slug_for(&name, payload.slug.as_deref())?,
                name,
                description: payload.description.trim().to_string(),
            })
            .await?;
        shared::component_info!(COMPONENT, "📂 Created category {} ({})", category.id, category.slug);
        Ok(category)
    }

    pub async fn update_category(&self, id: CategoryId, payload: CategoryPayload) -> StorefrontResult<Category> {
        let name = required_name(&payload.name)?;
        let category = Category {
            id,
            slug: slug_for(&name, payload.slug.as_deref())?,
            name,
            description: payload.description.trim().to_string(),
        };
        self.store.update_category(category).await
    }

    pub async fn delete_category(&self, id: CategoryId) -> StorefrontResult<()> {
        self.store.delete_category(id).await?;
        shared::component_info!(COMPONENT, "🗑️ Deleted category {}", id);
        Ok(())
    }

    pub async fn create_product(&self, payload: ProductPayload) -> StorefrontResult<Product> {
        let product = self.store.insert_product(product_draft(payload)?).await?;
        shared::component_info!(COMPONENT, "📦 Created product {} ({})", product.id, product.slug);
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, payload: ProductPayload) -> StorefrontResult<Product> {
        let draft = product_draft(payload)?;
        let change = self.store.patch_product(id, ProductPatch::from(draft)).await?;
        Ok(change.after)
    }

    /// Remove a product and its image
    pub async fn delete_product(&self, id: ProductId) -> StorefrontResult<()> {
        let product = self.store.delete_product(id).await?;
        if let Some(path) = &product.image_path {
            if let Err(e) = self.uploads.delete(path).await {
                shared::component_warn!(COMPONENT, "Could not remove image {} of deleted product {}: {}", path, id, e);
            }
        }
        shared::component_info!(COMPONENT, "🗑️ Deleted product {}", id);
        Ok(())
    }

    /// Store a new product image, replacing the previous one
    pub async fn set_product_image(&self, id: ProductId, file_name: &str, bytes: Vec<u8>) -> StorefrontResult<Product> {
        if self.store.product(id).await?.is_none() {
            return Err(StorefrontError::not_found("product", id));
        }

        let path = self.uploads.save_image(file_name, bytes).await?;
        let change = match self.store.patch_product(id, ProductPatch::image(path.clone())).await {
            Ok(change) => change,
            Err(e) => {
                if let Err(cleanup) = self.uploads.delete(&path).await {
                    shared::component_warn!(COMPONENT, "Could not remove unused image {}: {}", path, cleanup);
                }
                return Err(e);
            }
        };

        if let Some(previous) = change.before.image_path {
            if let Err(e) = self.uploads.delete(&previous).await {
                shared::component_warn!(COMPONENT, "Could not remove old image {}: {}", previous, e);
            }
        }
        Ok(change.after)
    }
}
