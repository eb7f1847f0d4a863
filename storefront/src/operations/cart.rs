//! Session cart operations

use uuid::Uuid;

use shared::ProductId;

use crate::core::{Cart, CartView};
use crate::error::{StorefrontError, StorefrontResult};
use crate::storefront_impl::Storefront;

const COMPONENT: &str = "cart";

impl Storefront {
    /// Refresh the session cart against the catalog and run `edit` on it as
    /// one step; a failed edit keeps the cart as it was
    async fn edit_cart(
        &self,
        session_id: Uuid,
        edit: impl FnOnce(&mut Cart) -> StorefrontResult<()> + Send + 'static,
    ) -> StorefrontResult<CartView> {
        let catalog = self.catalog_index().await?;
        let cart = self
            .sessions
            .update_cart(
                session_id,
                Box::new(move |cart: &mut Cart| {
                    let dropped = cart.reprice(&catalog);
                    if !dropped.is_empty() {
                        shared::component_info!(COMPONENT, "🧺 Dropped {} unavailable products from a cart", dropped.len());
                    }
                    edit(cart)
                }),
            )
            .await?;
        Ok(cart.view())
    }

    pub async fn cart_view(&self, session_id: Uuid) -> StorefrontResult<CartView> {
        self.edit_cart(session_id, |_| Ok(())).await
    }

    pub async fn add_to_cart(&self, session_id: Uuid, product_id: ProductId, quantity: u32) -> StorefrontResult<CartView> {
        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or_else(|| StorefrontError::not_found("product", product_id))?;

        self.edit_cart(session_id, move |cart| cart.add(&product, quantity)).await
    }

    /// Set a line's quantity; zero removes it
    pub async fn update_cart_item(
        &self,
        session_id: Uuid,
        product_id: ProductId,
        quantity: u32,
    ) -> StorefrontResult<CartView> {
        let product = self.store.product(product_id).await?;
        self.edit_cart(session_id, move |cart| {
            if cart.quantity_of(product_id) == 0 {
                return Err(StorefrontError::not_found("cart item", product_id));
            }
            match &product {
                Some(product) => cart.set_quantity(product, quantity),
                None => {
                    cart.remove(product_id);
                    Ok(())
                }
            }
        })
        .await
    }

    pub async fn remove_cart_item(&self, session_id: Uuid, product_id: ProductId) -> StorefrontResult<CartView> {
        self.edit_cart(session_id, move |cart| {
            if !cart.remove(product_id) {
                return Err(StorefrontError::not_found("cart item", product_id));
            }
            Ok(())
        })
        .await
    }

    pub async fn clear_cart(&self, session_id: Uuid) -> StorefrontResult<CartView> {
        let cart = self
            .sessions
            .update_cart(
                session_id,
                Box::new(|cart: &mut Cart| {
                    cart.clear();
                    Ok(())
                }),
            )
            .await?;
        Ok(cart.view())
    }

    /// Put a cart taken for checkout back in front of anything added since
    pub(crate) async fn restore_cart(&self, session_id: Uuid, kept: Cart) {
        let restored = self
            .sessions
            .update_cart(
                session_id,
                Box::new(move |cart: &mut Cart| {
                    let added = std::mem::replace(cart, kept);
                    cart.merge(added);
                    Ok(())
                }),
            )
            .await;
        if let Err(e) = restored {
            shared::component_warn!(COMPONENT, "Could not restore a cart after failed checkout: {}", e);
        }
    }
}
