//! Email gateway
//!
//! Fire-and-forget transactional mail through an HTTP gateway. Unconfigured
//! deployments get a logged no-op; send failures are logged and never
//! propagated to the caller.

use serde::Serialize;

use crate::db::models::Order;

#[derive(Debug, Serialize)]
struct MailRequest {
    from: String,
    to: String,
    subject: String,
    html: String,
}

#[derive(Clone)]
pub struct EmailService {
    client: reqwest::Client,
    api_url: Option<String>,
    api_key: Option<String>,
    from: String,
}

impl EmailService {
    pub fn new(api_url: Option<String>, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some()
    }

    /// Queue a mail; returns immediately
    pub fn send(&self, to: &str, subject: &str, html: &str) {
        let Some(api_url) = self.api_url.clone() else {
            tracing::debug!(to = %to, subject = %subject, "Email gateway not configured, skipping");
            return;
        };

        let request = MailRequest {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        };
        let client = self.client.clone();
        let api_key = self.api_key.clone();

        tokio::spawn(async move {
            let mut builder = client.post(&api_url).json(&request);
            if let Some(key) = &api_key {
                builder = builder.bearer_auth(key);
            }
            match builder.send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(to = %request.to, "Email sent");
                }
                Ok(response) => {
                    tracing::warn!(
                        to = %request.to,
                        status = %response.status(),
                        "Email gateway returned an error"
                    );
                }
                Err(e) => {
                    tracing::warn!(to = %request.to, error = %e, "Email send failed");
                }
            }
        });
    }

    pub fn send_order_confirmation(&self, to: &str, order: &Order) {
        let lines: String = order
            .items
            .iter()
            .map(|item| {
                format!(
                    "<li>{} × {} {} @ ₹{:.2}</li>",
                    item.name, item.quantity, item.unit, item.price
                )
            })
            .collect();
        let html = format!(
            "<h2>Order confirmed</h2>\
             <ul>{lines}</ul>\
             <p>Items: ₹{:.2} · Tax: ₹{:.2} · Shipping: ₹{:.2}</p>\
             <p><strong>Total: ₹{:.2}</strong></p>",
            order.items_price, order.tax_price, order.shipping_price, order.total_amount
        );
        self.send(to, "Your order is confirmed", &html);
    }

    pub fn send_subscription_receipt(&self, to: &str, product_name: &str, order: &Order) {
        let html = format!(
            "<h2>Subscription delivery scheduled</h2>\
             <p>Today's delivery of {product_name} is on its way.</p>\
             <p><strong>Total: ₹{:.2}</strong></p>",
            order.total_amount
        );
        self.send(to, "Subscription delivery", &html);
    }
}
