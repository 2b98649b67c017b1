//! Test harness: the full router over the in-memory store and a scripted gateway

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use acai_server::AppState;
use acai_server::api::build_app;
use acai_server::payment::{GatewayError, GatewayPayment, PaymentGateway, PixPaymentRequest};
use acai_server::persistence::{LocalStore, ShopStore};
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::{Value, json};
use shared::models::PaymentStatus;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Gateway double: payments live in a map the test can edit
#[derive(Default)]
pub struct MockGateway {
    payments: Mutex<HashMap<String, GatewayPayment>>,
    next_id: AtomicU32,
    pub fail_create: AtomicBool,
}

impl MockGateway {
    pub fn set_status(&self, payment_id: &str, status: PaymentStatus) {
        if let Some(p) = self.payments.lock().get_mut(payment_id) {
            p.status = status;
            p.raw_status = status.as_db().to_string();
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_pix_payment(
        &self,
        request: &PixPaymentRequest,
    ) -> Result<GatewayPayment, GatewayError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: 500,
                message: "boom".into(),
            });
        }
        let id = format!("pay-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let payment = GatewayPayment {
            id: id.clone(),
            status: PaymentStatus::Pending,
            raw_status: "pending".into(),
            status_detail: Some("pending_waiting_transfer".into()),
            external_reference: Some(request.order_id.to_string()),
            qr_code: Some(format!("00020126-pix-{id}")),
            qr_code_base64: Some("iVBORw0KGgo=".into()),
            ticket_url: Some(format!("https://pay.example/{id}")),
        };
        self.payments.lock().insert(id, payment.clone());
        Ok(payment)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.payments
            .lock()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Api {
                status: 404,
                message: "not found".into(),
            })
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<LocalStore>,
    pub gateway: Arc<MockGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(true)
    }

    /// No gateway configured: Pix is unavailable
    pub fn without_gateway() -> Self {
        Self::build(false)
    }

    fn build(with_gateway: bool) -> Self {
        let store = Arc::new(LocalStore::in_memory());
        let gateway = Arc::new(MockGateway::default());
        let shop_store: Arc<dyn ShopStore> = store.clone();
        let state = AppState::from_parts(
            shop_store,
            with_gateway.then(|| gateway.clone() as Arc<dyn PaymentGateway>),
            None,
            JWT_SECRET.to_string(),
            WEBHOOK_SECRET.to_string(),
            None,
        );
        Self {
            app: build_app(state.clone(), &[]),
            state,
            store,
            gateway,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    /// Register a store and return its admin token and id
    pub async fn register(&self, slug: &str) -> (String, i64) {
        let (status, body) = self
            .post(
                "/api/register",
                None,
                json!({
                    "slug": slug,
                    "name": format!("Loja {slug}"),
                    "email": format!("{slug}@acai.test"),
                    "password": "senha-forte-123",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        (
            body["token"].as_str().unwrap().to_string(),
            body["store"]["id"].as_i64().unwrap(),
        )
    }

    /// Force the store open so checkout does not depend on the clock
    pub async fn open_store(&self, token: &str) {
        let (status, body) = self
            .put("/api/admin/config", token, json!({ "open_override": true }))
            .await;
        assert_eq!(status, StatusCode::OK, "config update failed: {body}");
    }

    /// Create "Açaí no copo" (300ml R$ 14, 500ml R$ 19) offering every seeded group
    pub async fn create_product(&self, token: &str) -> i64 {
        let (_, categories) = self.get("/api/admin/categories", Some(token)).await;
        let category_id = categories[0]["id"].as_i64().unwrap();
        let (_, groups) = self.get("/api/admin/additional-categories", Some(token)).await;
        let group_ids: Vec<i64> = groups
            .as_array()
            .unwrap()
            .iter()
            .map(|g| g["id"].as_i64().unwrap())
            .collect();

        let (status, product) = self
            .post(
                "/api/admin/products",
                Some(token),
                json!({
                    "category_id": category_id,
                    "name": "Açaí no copo",
                    "sizes": [
                        { "name": "300ml", "price": 14.0, "free_additionals": 2, "max_additionals": 5 },
                        { "name": "500ml", "price": 19.0, "free_additionals": 3, "max_additionals": 7 },
                    ],
                    "additional_category_ids": group_ids,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "product create failed: {product}");
        product["id"].as_i64().unwrap()
    }

    /// Id of a seeded additional by name
    pub async fn additional_id(&self, token: &str, name: &str) -> i64 {
        let (_, additionals) = self.get("/api/admin/additionals", Some(token)).await;
        additionals
            .as_array()
            .unwrap()
            .iter()
            .find(|a| a["name"] == name)
            .and_then(|a| a["id"].as_i64())
            .unwrap()
    }
}

pub fn checkout_body(product_id: i64, payment_method: &str, fulfillment: &str) -> Value {
    json!({
        "customer_name": "Maria Souza",
        "customer_phone": "11988887777",
        "fulfillment": fulfillment,
        "address": "Rua das Palmeiras, 100",
        "payment_method": payment_method,
        "items": [
            { "product_id": product_id, "size": "300ml", "quantity": 2 }
        ],
    })
}
