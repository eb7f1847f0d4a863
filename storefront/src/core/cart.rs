//! Session cart
//!
//! Pure cart arithmetic; the session store persists the cart between requests.

use serde::{Deserialize, Serialize};
use shared::{Money, ProductId};
use std::collections::HashMap;

use crate::error::{StorefrontError, StorefrontResult};
use crate::types::{OrderLine, Product, StockRequest};

/// Orders at or above this subtotal ship free
pub const FREE_SHIPPING_THRESHOLD: Money = Money(5000);
pub const FLAT_SHIPPING_FEE: Money = Money(300);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u32,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
            .unwrap_or(0)
    }

    /// Add `quantity` units, merging with an existing line
    pub fn add(&mut self, product: &Product, quantity: u32) -> StorefrontResult<()> {
        if quantity == 0 {
            return Err(StorefrontError::invalid("quantity must be at least 1"));
        }
        let wanted = self.quantity_of(product.id).saturating_add(quantity);
        self.set_quantity(product, wanted)
    }

    /// Set the quantity of a product's line; zero removes it
    pub fn set_quantity(&mut self, product: &Product, quantity: u32) -> StorefrontResult<()> {
        if quantity == 0 {
            self.remove(product.id);
            return Ok(());
        }
        if !product.active {
            return Err(StorefrontError::not_found("product", product.id));
        }
        if quantity > product.stock {
            return Err(StorefrontError::OutOfStock {
                product_id: product.id,
                requested: quantity,
                available: product.stock,
            });
        }

        match self.lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(line) => {
                line.quantity = quantity;
                line.unit_price = product.price;
                line.name = product.name.clone();
            }
            None => self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Returns whether a line was removed
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Fold another cart's lines into this one, adding quantities of shared
    /// products. Stock is not checked; the next reprice or checkout does.
    pub fn merge(&mut self, other: Cart) {
        for incoming in other.lines {
            match self.lines.iter_mut().find(|line| line.product_id == incoming.product_id) {
                Some(line) => line.quantity = line.quantity.saturating_add(incoming.quantity),
                None => self.lines.push(incoming),
            }
        }
    }

    /// Refresh names and prices from the catalog and drop lines whose product
    /// is gone or inactive. Returns the dropped product ids.
    pub fn reprice(&mut self, catalog: &HashMap<ProductId, Product>) -> Vec<ProductId> {
        let mut dropped = Vec::new();
        self.lines.retain_mut(|line| match catalog.get(&line.product_id) {
            Some(product) if product.active => {
                line.unit_price = product.price;
                line.name = product.name.clone();
                true
            }
            _ => {
                dropped.push(line.product_id);
                false
            }
        });
        dropped
    }

    pub fn stock_requests(&self) -> Vec<StockRequest> {
        self.lines
            .iter()
            .map(|line| StockRequest {
                product_id: line.product_id,
                quantity: line.quantity,
            })
            .collect()
    }

    /// Snapshot the cart as order lines
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.lines
            .iter()
            .map(|line| OrderLine {
                product_id: line.product_id,
                product_name: line.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                line_total: line.line_total(),
            })
            .collect()
    }

    pub fn view(&self) -> CartView {
        let subtotal = self.subtotal();
        let shipping_fee = shipping_fee(subtotal);
        CartView {
            lines: self
                .lines
                .iter()
                .map(|line| CartLineView {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    unit_price: line.unit_price,
                    quantity: line.quantity,
                    line_total: line.line_total(),
                })
                .collect(),
            item_count: self.item_count(),
            subtotal,
            shipping_fee,
            total: subtotal + shipping_fee,
        }
    }
}

/// Flat fee below the free-shipping threshold, nothing for an empty cart
pub fn shipping_fee(subtotal: Money) -> Money {
    if subtotal.is_zero() || subtotal >= FREE_SHIPPING_THRESHOLD {
        Money::ZERO
    } else {
        FLAT_SHIPPING_FEE
    }
}
