//! Mercado Pago payments API

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Value, json};

use super::{GatewayError, GatewayPayment, PaymentGateway, PixPaymentRequest, map_status};

/// Gateway client over `reqwest` with bearer-token auth
#[derive(Clone)]
pub struct MercadoPagoGateway {
    client: reqwest::Client,
    access_token: String,
    api_base: String,
}

impl MercadoPagoGateway {
    pub fn new(access_token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            client,
            access_token: access_token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn read_json(resp: reqwest::Response) -> Result<Value, GatewayError> {
        let status = resp.status();
        let body: Value = resp.json().await?;
        if !status.is_success() {
            let message = body["message"]
                .as_str()
                .or_else(|| body["error"].as_str())
                .unwrap_or("unknown error")
                .to_string();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

/// Split "Ana Maria Souza" into first name and the rest
fn split_name(full: &str) -> (&str, &str) {
    let full = full.trim();
    match full.split_once(' ') {
        Some((first, rest)) => (first, rest.trim()),
        None => (full, ""),
    }
}

fn pix_body(request: &PixPaymentRequest) -> Value {
    let (first_name, last_name) = split_name(&request.payer_name);
    let mut body = json!({
        "transaction_amount": request.amount.to_f64().unwrap_or_default(),
        "description": request.description,
        "payment_method_id": "pix",
        "external_reference": request.order_id.to_string(),
        "payer": {
            "email": request.payer_email,
            "first_name": first_name,
            "last_name": last_name,
        },
    });
    if let Some(url) = &request.notification_url {
        body["notification_url"] = Value::String(url.clone());
    }
    body
}

/// Extract the fields we keep from a payment resource
pub(crate) fn parse_payment(value: &Value) -> Result<GatewayPayment, GatewayError> {
    let id = match &value["id"] {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err(GatewayError::InvalidResponse(format!("missing id: {value}"))),
    };
    let raw_status = value["status"]
        .as_str()
        .ok_or_else(|| GatewayError::InvalidResponse(format!("missing status: {value}")))?
        .to_string();
    let tx = &value["point_of_interaction"]["transaction_data"];
    let text = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(String::from);

    Ok(GatewayPayment {
        id,
        status: map_status(&raw_status),
        raw_status,
        status_detail: text(&value["status_detail"]),
        external_reference: text(&value["external_reference"]),
        qr_code: text(&tx["qr_code"]),
        qr_code_base64: text(&tx["qr_code_base64"]),
        ticket_url: text(&tx["ticket_url"]),
    })
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    async fn create_pix_payment(
        &self,
        request: &PixPaymentRequest,
    ) -> Result<GatewayPayment, GatewayError> {
        let resp = self
            .client
            .post(format!("{}/v1/payments", self.api_base))
            .bearer_auth(&self.access_token)
            // Retrying the same order never creates a second charge
            .header("X-Idempotency-Key", request.order_id.to_string())
            .json(&pix_body(request))
            .send()
            .await?;
        let body = Self::read_json(resp).await?;
        let payment = parse_payment(&body)?;
        tracing::info!(
            order_id = %request.order_id,
            payment_id = %payment.id,
            status = %payment.raw_status,
            "Pix payment created"
        );
        Ok(payment)
    }

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let resp = self
            .client
            .get(format!("{}/v1/payments/{payment_id}", self.api_base))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let body = Self::read_json(resp).await?;
        parse_payment(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::PaymentStatus;
    use uuid::Uuid;

    #[test]
    fn test_parse_pix_payment() {
        let value = json!({
            "id": 1325069127,
            "status": "pending",
            "status_detail": "pending_waiting_transfer",
            "external_reference": "4f0c...",
            "point_of_interaction": {
                "transaction_data": {
                    "qr_code": "00020126580014br.gov.bcb.pix",
                    "qr_code_base64": "iVBORw0KGgo=",
                    "ticket_url": "https://www.mercadopago.com.br/payments/1325069127/ticket"
                }
            }
        });
        let p = parse_payment(&value).unwrap();
        assert_eq!(p.id, "1325069127");
        assert_eq!(p.status, PaymentStatus::Pending);
        assert_eq!(p.status_detail.as_deref(), Some("pending_waiting_transfer"));
        assert_eq!(p.qr_code.as_deref(), Some("00020126580014br.gov.bcb.pix"));
        assert!(p.ticket_url.is_some());
    }

    #[test]
    fn test_parse_requires_id_and_status() {
        assert!(parse_payment(&json!({"status": "approved"})).is_err());
        assert!(parse_payment(&json!({"id": 1})).is_err());
        let p = parse_payment(&json!({"id": "77", "status": "approved"})).unwrap();
        assert_eq!(p.status, PaymentStatus::Approved);
        assert!(p.qr_code.is_none());
    }

    #[test]
    fn test_pix_body() {
        let order_id = Uuid::new_v4();
        let body = pix_body(&PixPaymentRequest {
            order_id,
            amount: Decimal::new(3580, 2),
            description: "Pedido #1".into(),
            payer_email: "ana@example.com".into(),
            payer_name: "Ana Maria Souza".into(),
            notification_url: None,
        });
        assert_eq!(body["transaction_amount"], 35.8);
        assert_eq!(body["payment_method_id"], "pix");
        assert_eq!(body["external_reference"], order_id.to_string());
        assert_eq!(body["payer"]["first_name"], "Ana");
        assert_eq!(body["payer"]["last_name"], "Maria Souza");
        assert!(body.get("notification_url").is_none());
    }
}
