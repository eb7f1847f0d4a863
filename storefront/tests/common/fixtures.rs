//! Catalog fixtures created through the admin API

use axum::http::StatusCode;
use serde_json::json;

use super::helpers::Client;

pub struct Catalog {
    pub tea_category: u64,
    pub coffee_category: u64,
    /// 4.50, stock 10
    pub green_tea: u64,
    /// 3.00, stock 0
    pub black_tea: u64,
    /// 15.00, stock 3
    pub espresso: u64,
}

async fn category(admin: &mut Client, name: &str) -> u64 {
    let response = admin.post("/api/admin/categories", json!({ "name": name })).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.data()["id"].as_u64().unwrap()
}

pub async fn product(admin: &mut Client, category_id: u64, name: &str, price: u64, stock: u32) -> u64 {
    let response = admin
        .post(
            "/api/admin/products",
            json!({
                "category_id": category_id,
                "name": name,
                "description": format!("{name} from the test catalog"),
                "price": price,
                "stock": stock,
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.data()["id"].as_u64().unwrap()
}

pub async fn seed_catalog(admin: &mut Client) -> Catalog {
    let tea_category = category(admin, "Tea").await;
    let coffee_category = category(admin, "Coffee").await;
    Catalog {
        tea_category,
        coffee_category,
        green_tea: product(admin, tea_category, "Green Tea", 450, 10).await,
        black_tea: product(admin, tea_category, "Black Tea", 300, 0).await,
        espresso: product(admin, coffee_category, "Espresso Beans", 1500, 3).await,
    }
}
