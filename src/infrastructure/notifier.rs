use crate::domain::loan::User;
use crate::domain::ports::{Digest, Notifier};
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Delivers notifications as structured log events.
///
/// Stands in for email/SMS delivery when the harness runs without a
/// delivery backend.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_payment_reminder(&self, repayment_id: Uuid) -> Result<()> {
        info!(target: "loanops::delivery", %repayment_id, "payment reminder");
        Ok(())
    }

    async fn send_overdue_notification(&self, repayment_id: Uuid, days_overdue: i64) -> Result<()> {
        info!(target: "loanops::delivery", %repayment_id, days_overdue, "overdue notification");
        Ok(())
    }

    async fn send_review_reminder(&self, loan_id: Uuid) -> Result<()> {
        info!(target: "loanops::delivery", %loan_id, "application review reminder");
        Ok(())
    }

    async fn send_digest(&self, recipients: &[User], digest: &Digest) -> Result<()> {
        let to: Vec<&str> = recipients.iter().map(|u| u.email.as_str()).collect();
        info!(
            target: "loanops::delivery",
            recipients = ?to,
            run_date = %digest.run_date,
            upcoming = digest.upcoming,
            overdue = digest.overdue,
            review = digest.review,
            errors = digest.errors,
            "reminder digest"
        );
        Ok(())
    }
}
