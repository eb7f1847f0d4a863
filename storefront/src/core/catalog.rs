//! Catalog listing rules
//!
//! Filtering, sorting and pagination over product rows. Pure functions: the
//! caller loads rows from the store and resolves the category first.

use serde::{Deserialize, Serialize};
use shared::{CategoryId, Money};

use crate::types::{Page, Product};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    BestSelling,
}

/// Query string accepted by product listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    /// Category slug or numeric id
    pub category: Option<String>,
    pub q: Option<String>,
    /// Inclusive lower bound, minor units
    pub min_price: Option<u64>,
    /// Inclusive upper bound, minor units
    pub max_price: Option<u64>,
    pub in_stock: Option<bool>,
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Resolved filter applied to product rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub in_stock_only: bool,
    pub include_inactive: bool,
}

impl ProductFilter {
    pub fn from_query(query: &ProductQuery, category_id: Option<CategoryId>, include_inactive: bool) -> Self {
        Self {
            category_id,
            search: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_lowercase),
            min_price: query.min_price.map(Money),
            max_price: query.max_price.map(Money),
            in_stock_only: query.in_stock.unwrap_or(false),
            include_inactive,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if !self.include_inactive && !product.active {
            return false;
        }
        if self.category_id.is_some_and(|id| id != product.category_id) {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if self.in_stock_only && product.stock == 0 {
            return false;
        }
        match &self.search {
            Some(needle) => {
                product.name.to_lowercase().contains(needle) || product.description.to_lowercase().contains(needle)
            }
            None => true,
        }
    }
}

/// Filter, sort and paginate products
pub fn list_products(products: Vec<Product>, filter: &ProductFilter, query: &ProductQuery) -> Page<Product> {
    let mut matching: Vec<Product> = products.into_iter().filter(|p| filter.matches(p)).collect();
    sort_products(&mut matching, query.sort.unwrap_or_default());
    paginate(matching, query.page, query.page_size)
}

pub fn sort_products(products: &mut [Product], order: SortOrder) {
    match order {
        // Ties on timestamps fall back to id so listings are stable
        SortOrder::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))),
        SortOrder::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id))),
        SortOrder::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id))),
        SortOrder::NameAsc => products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
        SortOrder::NameDesc => products.sort_by(|a, b| b.name.to_lowercase().cmp(&a.name.to_lowercase())),
        SortOrder::BestSelling => products.sort_by(|a, b| b.sold.cmp(&a.sold).then(a.id.cmp(&b.id))),
    }
}

/// Slice `items` into the requested 1-based page
pub fn paginate<T>(items: Vec<T>, page: Option<u32>, page_size: Option<u32>) -> Page<T> {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let total_pages = total.div_ceil(page_size as usize) as u32;

    let start = (page as usize - 1).saturating_mul(page_size as usize);
    let items = items.into_iter().skip(start).take(page_size as usize).collect();

    Page {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

/// URL-safe slug: lower-case ASCII alphanumerics separated by single dashes
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Up to `limit` other active products from the same category
pub fn related_products(product: &Product, all: &[Product], limit: usize) -> Vec<Product> {
    let mut related: Vec<Product> = all
        .iter()
        .filter(|p| p.id != product.id && p.active && p.category_id == product.category_id)
        .cloned()
        .collect();
    sort_products(&mut related, SortOrder::BestSelling);
    related.truncate(limit);
    related
}
