//! Test helpers driving the router in-process

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use storefront::{StoreConfig, Storefront};

pub const ADMIN_EMAIL: &str = "admin@shop.test";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const PASSWORD: &str = "secret-pass";

/// Storefront with the bootstrap admin and a scratch directory
pub struct TestApp {
    pub storefront: Storefront,
    pub router: Router,
    pub dir: TempDir,
}

pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

/// Like `test_app`, with a chance to adjust the development config first
pub async fn test_app_with(configure: impl FnOnce(&mut StoreConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StoreConfig::development(dir.path());
    config.admin_email = Some(ADMIN_EMAIL.to_string());
    config.admin_password = Some(ADMIN_PASSWORD.to_string());
    configure(&mut config);

    let storefront = Storefront::from_config(config).await.unwrap();
    let router = storefront.build_router();
    TestApp {
        storefront,
        router,
        dir,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestResponse {
    /// Payload of a success envelope
    pub fn data(&self) -> &Value {
        assert_eq!(self.body["status"], "ok", "unexpected body {}", self.body);
        &self.body["data"]
    }
}

/// Browser stand-in that keeps the session cookie between requests
#[derive(Clone)]
pub struct Client {
    router: Router,
    pub cookie: Option<String>,
}

impl Client {
    pub fn new(app: &TestApp) -> Self {
        Self {
            router: app.router.clone(),
            cookie: None,
        }
    }

    pub async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if let Some(cookie) = &set_cookie {
            let pair = cookie.split(';').next().unwrap_or_default().to_string();
            self.cookie = if cookie.contains("Max-Age=0") { None } else { Some(pair) };
        }

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
        };
        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn post_empty(&mut self, uri: &str) -> TestResponse {
        self.request(Method::POST, uri, None).await
    }

    pub async fn put(&mut self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&mut self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post("/api/auth/login", json!({ "email": email, "password": password })).await
    }
}

pub async fn admin(app: &TestApp) -> Client {
    let mut client = Client::new(app);
    let response = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    client
}

/// Register and log in a customer
pub async fn customer(app: &TestApp, email: &str) -> Client {
    let mut client = Client::new(app);
    let response = client
        .post(
            "/api/auth/register",
            json!({ "email": email, "password": PASSWORD, "full_name": "Test Customer" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(client.login(email, PASSWORD).await.status, StatusCode::OK);
    client
}

/// Register a user, promote them to shipper and log them in. Returns the
/// client and the shipper's id.
pub async fn shipper(app: &TestApp, admin: &mut Client, email: &str) -> (Client, u64) {
    let mut client = Client::new(app);
    let registered = client
        .post(
            "/api/auth/register",
            json!({ "email": email, "password": PASSWORD, "full_name": "Test Shipper" }),
        )
        .await;
    let id = registered.data()["id"].as_u64().unwrap();

    let promoted = admin
        .post(&format!("/api/admin/users/{id}/role"), json!({ "role": "shipper" }))
        .await;
    assert_eq!(promoted.status, StatusCode::OK);

    assert_eq!(client.login(email, PASSWORD).await.status, StatusCode::OK);
    (client, id)
}

/// Put `quantity` of a product in the cart and check out
pub async fn place_order(client: &mut Client, product_id: u64, quantity: u32, payment_method: &str) -> TestResponse {
    let added = client
        .post("/api/cart/items", json!({ "product_id": product_id, "quantity": quantity }))
        .await;
    assert_eq!(added.status, StatusCode::OK, "{}", added.body);

    client
        .post(
            "/api/checkout",
            json!({
                "recipient_name": "Ana Lima",
                "phone": "555-0100",
                "address": "1 Harbour Road",
                "payment_method": payment_method,
            }),
        )
        .await
}

/// Current stock of a product as the admin listing reports it
pub async fn stock_of(admin: &mut Client, product_id: u64) -> u64 {
    let listing = admin.get("/api/admin/products?page_size=100").await;
    listing.data()["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == product_id)
        .map(|p| p["stock"].as_u64().unwrap())
        .unwrap()
}
