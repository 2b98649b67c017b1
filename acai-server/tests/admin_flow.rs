mod common;

use acai_server::payment::sign_webhook;
use axum::body::Body;
use common::{TestApp, WEBHOOK_SECRET, checkout_body};
use http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use shared::models::PaymentStatus;

fn webhook_request(payment_id: &str, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(format!("/webhooks/payments?data.id={payment_id}&type=payment"))
        .header("content-type", "application/json")
        .header("x-request-id", "req-abc");
    if let Some(sig) = signature {
        builder = builder.header("x-signature", sig);
    }
    builder
        .body(Body::from(
            json!({ "action": "payment.updated", "type": "payment", "data": { "id": payment_id } })
                .to_string(),
        ))
        .unwrap()
}

async fn place_pix_order(app: &TestApp, slug: &str, token: &str) -> Value {
    app.open_store(token).await;
    let product_id = app.create_product(token).await;
    let (status, res) = app
        .post(
            &format!("/api/shops/{slug}/checkout"),
            None,
            checkout_body(product_id, "pix", "delivery"),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{res}");
    res
}

async fn notification_kinds(app: &TestApp, token: &str) -> Vec<String> {
    let (_, body) = app.get("/api/admin/notifications", Some(token)).await;
    body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
    let app = TestApp::new();
    app.register("acai-praia").await;

    let (status, body) = app
        .post(
            "/api/register",
            None,
            json!({ "slug": "acai-praia", "name": "Outra", "email": "outra@acai.test", "password": "senha-forte-123" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 3002);

    let (_, body) = app
        .post(
            "/api/register",
            None,
            json!({ "slug": "Acai Praia", "name": "Outra", "email": "x@acai.test", "password": "senha-forte-123" }),
        )
        .await;
    assert_eq!(body["code"], 3005);
}

#[tokio::test]
async fn login_and_token_checks() {
    let app = TestApp::new();
    let (_, store_id) = app.register("acai-login").await;

    let (status, body) = app
        .post(
            "/api/admin/login",
            None,
            json!({ "email": "ACAI-LOGIN@acai.test", "password": "senha-forte-123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["store"]["id"], store_id);
    assert!(body["store"].get("hashed_password").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .post(
            "/api/admin/login",
            None,
            json!({ "email": "acai-login@acai.test", "password": "errada" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);

    let (status, _) = app.get("/api/admin/config", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get("/api/admin/config", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1004);

    let (status, me) = app.get("/api/admin/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["store"]["slug"], "acai-login");
}

#[tokio::test]
async fn admin_data_is_scoped_to_the_token_store() {
    let app = TestApp::new();
    let (token_a, _) = app.register("acai-a").await;
    let (token_b, _) = app.register("acai-b").await;

    let (_, categories) = app.get("/api/admin/categories", Some(&token_a)).await;
    let category_a = categories[0]["id"].as_i64().unwrap();

    let (status, body) = app
        .get(&format!("/api/admin/categories/{category_a}"), Some(&token_b))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6101);

    let (status, _) = app
        .put(
            &format!("/api/admin/categories/{category_a}"),
            &token_b,
            json!({ "name": "Hackeado" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Store B cannot build a product on store A's category
    let (status, body) = app
        .post(
            "/api/admin/products",
            Some(&token_b),
            json!({
                "category_id": category_a,
                "name": "Intruso",
                "sizes": [{ "name": "300ml", "price": 10.0 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6005);
}

#[tokio::test]
async fn catalog_deletes_respect_references() {
    let app = TestApp::new();
    let (token, _) = app.register("acai-refs").await;
    let product_id = app.create_product(&token).await;

    let (_, categories) = app.get("/api/admin/categories", Some(&token)).await;
    let category_id = categories[0]["id"].as_i64().unwrap();
    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/admin/categories/{category_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6102);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/api/admin/products/{product_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/admin/categories/{category_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (_, groups) = app.get("/api/admin/additional-categories", Some(&token)).await;
    let frutas = groups[0]["id"].as_i64().unwrap();
    assert_eq!(groups[0]["max_selections"], 3);

    // Explicit null lifts the cap; omitted keys are left alone
    let uri = format!("/api/admin/additional-categories/{frutas}");
    let (status, body) = app.put(&uri, &token, json!({ "max_selections": null })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["max_selections"].is_null());
    let (_, body) = app.put(&uri, &token, json!({ "sort_order": 9 })).await;
    assert!(body["max_selections"].is_null());
    assert_eq!(body["sort_order"], 9);
    let (status, body) = app
        .call(
            Method::DELETE,
            &format!("/api/admin/additional-categories/{frutas}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 6302);

    let (status, body) = app
        .post(
            "/api/admin/additional-categories",
            Some(&token),
            json!({ "name": "Caldas", "min_selections": 3, "max_selections": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 8);
}

#[tokio::test]
async fn order_status_follows_the_workflow() {
    let app = TestApp::new();
    let (token, _) = app.register("acai-fluxo").await;
    app.open_store(&token).await;
    let product_id = app.create_product(&token).await;
    let (_, res) = app
        .post(
            "/api/shops/acai-fluxo/checkout",
            None,
            checkout_body(product_id, "cash", "pickup"),
        )
        .await;
    let order_id = res["order"]["id"].as_str().unwrap().to_string();
    let uri = format!("/api/admin/orders/{order_id}/status");

    let (status, body) = app.put(&uri, &token, json!({ "status": "preparing" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4006);

    for next in ["confirmed", "preparing", "ready"] {
        let (status, body) = app.put(&uri, &token, json!({ "status": next })).await;
        assert_eq!(status, StatusCode::OK, "{next}: {body}");
        assert_eq!(body["status"], next);
    }

    // Pickup orders never go out for delivery
    let (_, body) = app
        .put(&uri, &token, json!({ "status": "out_for_delivery" }))
        .await;
    assert_eq!(body["code"], 4006);

    let (_, body) = app.put(&uri, &token, json!({ "status": "delivered" })).await;
    assert_eq!(body["status"], "delivered");

    let (status, body) = app.put(&uri, &token, json!({ "status": "cancelled" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4007);

    let (_, page) = app
        .get("/api/admin/orders?status=delivered&per_page=5", Some(&token))
        .await;
    assert_eq!(page["orders"].as_array().unwrap().len(), 1);
    assert_eq!(page["per_page"], 5);

    let (status, dashboard) = app.get("/api/admin/dashboard", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["order_count"], 1);
    assert_eq!(dashboard["revenue"].as_f64(), Some(28.0));
    assert_eq!(dashboard["top_products"][0]["quantity"], 2);
}

#[tokio::test]
async fn pix_checkout_and_signed_webhook() {
    let app = TestApp::new();
    let (token, _) = app.register("acai-pix").await;
    let res = place_pix_order(&app, "acai-pix", &token).await;
    assert_eq!(res["awaiting_payment"], true);
    let order = &res["order"];
    assert_eq!(order["payment_id"], "pay-1");
    assert!(order["payment_qr_code"].as_str().unwrap().contains("pix"));
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, body) = app.send(webhook_request("pay-1", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 5008);
    let forged = sign_webhook("req-abc", "pay-1", 1_700_000_000, "wrong-secret");
    let (status, body) = app.send(webhook_request("pay-1", Some(forged))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 5008);

    app.gateway.set_status("pay-1", PaymentStatus::Approved);
    let signature = sign_webhook("req-abc", "pay-1", 1_700_000_000, WEBHOOK_SECRET);
    let (status, _) = app
        .send(webhook_request("pay-1", Some(signature.clone())))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, order) = app
        .get(&format!("/api/admin/orders/{order_id}"), Some(&token))
        .await;
    assert_eq!(order["payment_status"], "approved");
    assert_eq!(order["status"], "confirmed");

    // Replays change nothing
    let (status, _) = app.send(webhook_request("pay-1", Some(signature))).await;
    assert_eq!(status, StatusCode::OK);
    let kinds = notification_kinds(&app, &token).await;
    assert_eq!(kinds.iter().filter(|k| *k == "payment_approved").count(), 1);
    assert_eq!(kinds.iter().filter(|k| *k == "new_order").count(), 1);
}

#[tokio::test]
async fn manual_reconcile_applies_gateway_status() {
    let app = TestApp::new();
    let (token, _) = app.register("acai-conc").await;
    let res = place_pix_order(&app, "acai-conc", &token).await;
    let order_id = res["order"]["id"].as_str().unwrap().to_string();
    let (other_token, _) = app.register("acai-vizinha").await;
    let other = place_pix_order(&app, "acai-vizinha", &other_token).await;
    let other_id = other["order"]["id"].as_str().unwrap().to_string();

    app.gateway.set_status("pay-1", PaymentStatus::Rejected);
    app.gateway.set_status("pay-2", PaymentStatus::Approved);
    let (status, summary) = app
        .post("/api/admin/payments/reconcile", Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["checked"], 1);
    assert_eq!(summary["updated"], 1);

    let (_, order) = app
        .get(&format!("/api/admin/orders/{order_id}"), Some(&token))
        .await;
    assert_eq!(order["payment_status"], "rejected");
    assert_eq!(order["status"], "cancelled");

    // Only the caller's store was checked
    let (_, other) = app
        .get(&format!("/api/admin/orders/{other_id}"), Some(&other_token))
        .await;
    assert_eq!(other["payment_status"], "pending");

    let (_, summary) = app
        .post("/api/admin/payments/reconcile", Some(&token), json!({}))
        .await;
    assert_eq!(summary["checked"], 0);
}

#[tokio::test]
async fn gateway_failure_cancels_the_order() {
    let app = TestApp::new();
    let (token, _) = app.register("acai-falha").await;
    app.open_store(&token).await;
    let product_id = app.create_product(&token).await;
    app.gateway
        .fail_create
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let (status, body) = app
        .post(
            "/api/shops/acai-falha/checkout",
            None,
            checkout_body(product_id, "pix", "pickup"),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], 5007);

    let (_, page) = app.get("/api/admin/orders", Some(&token)).await;
    let orders = page["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["status"], "cancelled");
    assert_eq!(orders[0]["payment_status"], "cancelled");
}

#[tokio::test]
async fn push_subscriptions_round_trip() {
    let app = TestApp::new();
    let (token, store_id) = app.register("acai-push").await;

    let (status, body) = app
        .post(
            "/api/admin/push-subscriptions",
            Some(&token),
            json!({ "endpoint": "http://insecure", "keys": { "p256dh": "k", "auth": "a" } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 6);

    let endpoint = "https://push.example/sub/1";
    let (status, _) = app
        .post(
            "/api/admin/push-subscriptions",
            Some(&token),
            json!({ "endpoint": endpoint, "keys": { "p256dh": "k", "auth": "a" } }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    {
        use acai_server::persistence::ShopStore;
        let subs = app.store.list_push_subscriptions(store_id).await.unwrap();
        assert_eq!(subs.len(), 1);
    }

    let (_, body) = app
        .call(
            Method::DELETE,
            "/api/admin/push-subscriptions",
            Some(&token),
            Some(json!({ "endpoint": endpoint })),
        )
        .await;
    assert_eq!(body["removed"], true);
}
