//! Reset-token delivery collaborator. Out-of-band delivery (email) is not
//! this crate's concern; the core hands the token off through this seam.

pub trait Delivery: Send + Sync {
    fn deliver_reset_token(&self, email: &str, token: &str);
}

/// Default handoff: log the token so an operator or a log-tailing mailer
/// can pick it up.
#[derive(Debug, Default)]
pub struct LogDelivery;

impl Delivery for LogDelivery {
    fn deliver_reset_token(&self, email: &str, token: &str) {
        tracing::info!(email = %email, token = %token, "Password reset token issued, handing off for delivery");
    }
}
