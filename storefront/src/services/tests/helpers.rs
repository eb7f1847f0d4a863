//! Test helpers for storefront service tests

use shared::{Role, UserId};

use super::fixtures::*;
use crate::services::RealStore;
use crate::traits::Store;
use crate::types::{Category, Product};

/// Store seeded with one customer, one category and two products
pub struct SeededStore {
    pub store: RealStore,
    pub customer: UserId,
    pub category: Category,
    pub tea: Product,
    pub beans: Product,
}

pub async fn seeded_store() -> SeededStore {
    let store = RealStore::in_memory();
    let customer = store
        .insert_user(new_user("ana@example.com", Role::Customer))
        .await
        .unwrap()
        .id;
    let category = store.insert_category(category_draft("Drinks")).await.unwrap();
    let tea = store
        .insert_product(product_draft(category.id, "Green Tea", 450, 10))
        .await
        .unwrap();
    let beans = store
        .insert_product(product_draft(category.id, "Espresso Beans", 1500, 3))
        .await
        .unwrap();

    SeededStore {
        store,
        customer,
        category,
        tea,
        beans,
    }
}
