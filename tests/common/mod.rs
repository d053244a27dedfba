#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use loanops::application::queue::{ReminderQueue, ReminderTask};
use loanops::application::reminders::ReminderEngine;
use loanops::domain::audit::AuditRecord;
use loanops::domain::entity::EntityId;
use loanops::domain::loan::{LoanApplication, Repayment, RepaymentStatus, Role, User};
use loanops::domain::money::Amount;
use loanops::domain::ports::{AuditStore, Digest, EntityStore, Notifier, RepaymentStore};
use loanops::error::{LoanOpsError, Result};
use loanops::infrastructure::in_memory::{
    InMemoryLoanApplicationStore, InMemoryRepaymentStore, InMemoryUserDirectory,
};
use rust_decimal_macros::dec;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap()
}

pub fn today() -> NaiveDate {
    now().date_naive()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub fn repayment(due_date: NaiveDate, status: RepaymentStatus) -> Repayment {
    let mut r = Repayment::new(Uuid::new_v4(), 1, due_date, Amount::new(dec!(250.00)).unwrap());
    r.status = status;
    r
}

pub fn application_created_days_ago(days: i64) -> LoanApplication {
    let mut loan = LoanApplication::new(Uuid::new_v4(), Amount::new(dec!(5000)).unwrap());
    loan.created_at = now() - Duration::days(days);
    loan
}

/// Every outbound call the reminder engine makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    PaymentReminder(Uuid),
    Overdue { repayment_id: Uuid, days_overdue: i64 },
    Review(Uuid),
    Digest { recipients: Vec<String>, digest: Digest },
}

/// Notifier that records calls and fails for chosen records.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Sent>>,
    failing: Mutex<HashSet<Uuid>>,
    fail_digest: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, id: Uuid) {
        self.failing.lock().unwrap().insert(id);
    }

    pub fn fail_digest(&self) {
        *self.fail_digest.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn digests(&self) -> Vec<Digest> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Digest { digest, .. } => Some(digest),
                _ => None,
            })
            .collect()
    }

    fn record(&self, id: Option<Uuid>, sent: Sent) -> Result<()> {
        if let Some(id) = id
            && self.failing.lock().unwrap().contains(&id)
        {
            return Err(LoanOpsError::Delivery(format!("gateway rejected {id}")));
        }
        self.sent.lock().unwrap().push(sent);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_payment_reminder(&self, repayment_id: Uuid) -> Result<()> {
        self.record(Some(repayment_id), Sent::PaymentReminder(repayment_id))
    }

    async fn send_overdue_notification(&self, repayment_id: Uuid, days_overdue: i64) -> Result<()> {
        self.record(
            Some(repayment_id),
            Sent::Overdue {
                repayment_id,
                days_overdue,
            },
        )
    }

    async fn send_review_reminder(&self, loan_id: Uuid) -> Result<()> {
        self.record(Some(loan_id), Sent::Review(loan_id))
    }

    async fn send_digest(&self, recipients: &[User], digest: &Digest) -> Result<()> {
        if *self.fail_digest.lock().unwrap() {
            return Err(LoanOpsError::Delivery("smtp down".to_string()));
        }
        self.record(
            None,
            Sent::Digest {
                recipients: recipients.iter().map(|u| u.email.clone()).collect(),
                digest: digest.clone(),
            },
        )
    }
}

/// Audit store that reports itself available but rejects every write.
#[derive(Default)]
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    async fn append(&self, _record: AuditRecord) -> Result<()> {
        Err(LoanOpsError::Storage("disk full".to_string()))
    }

    async fn list(&self) -> Result<Vec<AuditRecord>> {
        Ok(Vec::new())
    }

    async fn find_for_object(&self, _model_name: &str, _object_id: &EntityId) -> Result<Vec<AuditRecord>> {
        Ok(Vec::new())
    }
}

/// Repayment store whose eligibility queries always fail.
pub struct BrokenRepaymentStore;

#[async_trait]
impl RepaymentStore for BrokenRepaymentStore {
    async fn due_between(
        &self,
        _from: NaiveDate,
        _to: NaiveDate,
        _statuses: &[RepaymentStatus],
    ) -> Result<Vec<Repayment>> {
        Err(LoanOpsError::Storage("connection reset".to_string()))
    }

    async fn due_before(&self, _date: NaiveDate, _statuses: &[RepaymentStatus]) -> Result<Vec<Repayment>> {
        Err(LoanOpsError::Storage("connection reset".to_string()))
    }

    async fn set_status(&self, id: Uuid, _status: RepaymentStatus) -> Result<()> {
        Err(LoanOpsError::NotFound {
            entity: "repayment",
            id: id.to_string(),
        })
    }
}

/// In-memory reminder setup with a recording notifier and an inspectable queue.
pub struct Harness {
    pub repayments: Arc<InMemoryRepaymentStore>,
    pub applications: Arc<InMemoryLoanApplicationStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub queue: ReminderQueue,
    pub tasks: UnboundedReceiver<ReminderTask>,
}

impl Harness {
    pub async fn new() -> Self {
        let users = Arc::new(InMemoryUserDirectory::new());
        users
            .add(User::new("ops-admin", "ops@example.com", Role::Admin))
            .await;
        let (queue, tasks) = ReminderQueue::channel();
        Self {
            repayments: Arc::new(InMemoryRepaymentStore::new()),
            applications: Arc::new(InMemoryLoanApplicationStore::new()),
            users,
            notifier: Arc::new(RecordingNotifier::new()),
            queue,
            tasks,
        }
    }

    pub async fn add_repayment(&self, repayment: &Repayment) {
        self.repayments.save(repayment.clone()).await.unwrap();
    }

    pub async fn add_application(&self, application: &LoanApplication) {
        self.applications.save(application.clone()).await.unwrap();
    }

    pub fn engine(&self) -> ReminderEngine {
        ReminderEngine::new(
            self.repayments.clone(),
            self.applications.clone(),
            self.users.clone(),
            self.notifier.clone(),
            self.queue.clone(),
        )
    }

    /// Tasks queued so far.
    pub fn queued(&mut self) -> Vec<ReminderTask> {
        let mut tasks = Vec::new();
        while let Ok(task) = self.tasks.try_recv() {
            tasks.push(task);
        }
        tasks
    }

    pub async fn status_of(&self, id: Uuid) -> RepaymentStatus {
        self.repayments
            .get(&id.into())
            .await
            .unwrap()
            .unwrap()
            .status
    }
}
