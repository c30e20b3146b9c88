//! External collaborators: email dispatch and the payment gateway. Both are
//! call/response contracts; real integrations live behind these traits.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct UpstreamError(pub String);

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Fire-and-forget email dispatch; callers log failures instead of surfacing
/// them.
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    async fn send(&self, message: EmailMessage) -> Result<(), UpstreamError>;
}

/// Default mailer for development and tests: logs the message and succeeds.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), UpstreamError> {
        info!(to = %message.to, subject = %message.subject, "email dispatched (log mailer)");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutLineItem {
    pub name: String,
    pub thumbnail: Option<String>,
    /// Minor currency units (fee * 100).
    pub unit_amount: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn create_checkout_session(
        &self,
        line_item: CheckoutLineItem,
    ) -> Result<CheckoutSession, UpstreamError>;
}

/// Stand-in gateway returning a deterministic checkout URL.
pub struct StubGateway;

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_checkout_session(
        &self,
        line_item: CheckoutLineItem,
    ) -> Result<CheckoutSession, UpstreamError> {
        info!(name = %line_item.name, amount = line_item.unit_amount, "stub checkout session");
        Ok(CheckoutSession {
            url: format!(
                "https://checkout.invalid/session?amount={}&currency={}",
                line_item.unit_amount, line_item.currency
            ),
        })
    }
}
