use super::queue::{ReminderQueue, ReminderTask};
use crate::domain::loan::{Repayment, RepaymentStatus};
use crate::domain::ports::{
    Digest, LoanApplicationStoreRef, NotifierRef, RepaymentStoreRef, UserDirectoryRef,
};
use crate::error::Result;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

/// Pending applications created this many calendar days ago or earlier get a
/// staff review reminder.
pub const STALE_APPLICATION_AGE_DAYS: u64 = 2;

const UPCOMING_STATUSES: [RepaymentStatus; 2] = [RepaymentStatus::Pending, RepaymentStatus::Upcoming];
const OVERDUE_STATUSES: [RepaymentStatus; 2] = [RepaymentStatus::Pending, RepaymentStatus::Overdue];

/// Parameters of one reminder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderOptions {
    /// Count eligible records without dispatching or writing anything.
    pub simulate: bool,
    pub look_ahead_days: u32,
    /// Run only the overdue pass.
    pub overdue_only: bool,
}

impl Default for ReminderOptions {
    fn default() -> Self {
        Self {
            simulate: false,
            look_ahead_days: 3,
            overdue_only: false,
        }
    }
}

/// Outcome of one reminder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub upcoming_count: usize,
    pub overdue_count: usize,
    pub review_count: usize,
    pub error_count: usize,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.upcoming_count + self.overdue_count + self.review_count
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "upcoming_reminders,{}", self.upcoming_count)?;
        writeln!(f, "overdue_notifications,{}", self.overdue_count)?;
        writeln!(f, "review_reminders,{}", self.review_count)?;
        write!(f, "errors,{}", self.error_count)
    }
}

/// Scans repayments and loan applications and dispatches reminders.
///
/// One call to [`ReminderEngine::run`] is one batch: the upcoming, overdue
/// and stale-application passes run in that order, then a digest goes to
/// the active admins. Every eligible record is handled at most once per
/// run. Nothing is remembered between runs, so a repayment that stays in
/// the look-ahead window is reminded again on the next run.
pub struct ReminderEngine {
    repayments: RepaymentStoreRef,
    applications: LoanApplicationStoreRef,
    users: UserDirectoryRef,
    notifier: NotifierRef,
    queue: ReminderQueue,
}

impl ReminderEngine {
    pub fn new(
        repayments: RepaymentStoreRef,
        applications: LoanApplicationStoreRef,
        users: UserDirectoryRef,
        notifier: NotifierRef,
        queue: ReminderQueue,
    ) -> Self {
        Self {
            repayments,
            applications,
            users,
            notifier,
            queue,
        }
    }

    pub async fn run(&self, options: &ReminderOptions) -> RunSummary {
        self.run_at(options, Utc::now()).await
    }

    /// Runs all passes as of `now`. Never fails; problems surface in
    /// `error_count` and the log.
    pub async fn run_at(&self, options: &ReminderOptions, now: DateTime<Utc>) -> RunSummary {
        let today = now.date_naive();
        info!(
            %today,
            simulate = options.simulate,
            look_ahead_days = options.look_ahead_days,
            overdue_only = options.overdue_only,
            "starting reminder run"
        );

        let mut summary = RunSummary::default();
        if let Err(e) = self.run_passes(options, today, &mut summary).await {
            error!(error = %e, "reminder run aborted");
            summary.error_count += 1;
        }

        if !options.simulate && summary.total() > 0 {
            self.send_digest(today, &summary).await;
        }

        info!(
            upcoming = summary.upcoming_count,
            overdue = summary.overdue_count,
            review = summary.review_count,
            errors = summary.error_count,
            "reminder run finished"
        );
        summary
    }

    async fn run_passes(
        &self,
        options: &ReminderOptions,
        today: NaiveDate,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if !options.overdue_only {
            self.upcoming_pass(options, today, summary).await?;
        }
        self.overdue_pass(options, today, summary).await?;
        if !options.overdue_only {
            self.stale_application_pass(options, today, summary).await?;
        }
        Ok(())
    }

    async fn upcoming_pass(
        &self,
        options: &ReminderOptions,
        today: NaiveDate,
        summary: &mut RunSummary,
    ) -> Result<()> {
        // A window past the end of the calendar covers every future date.
        let horizon = today
            .checked_add_days(Days::new(u64::from(options.look_ahead_days)))
            .unwrap_or(NaiveDate::MAX);
        let due = self
            .repayments
            .due_between(today, horizon, &UPCOMING_STATUSES)
            .await?;

        for repayment in due {
            summary.upcoming_count += 1;
            if options.simulate {
                debug!(repayment_id = %repayment.id, due_date = %repayment.due_date, "would queue payment reminder");
                continue;
            }
            let task = ReminderTask::PaymentReminder {
                repayment_id: repayment.id,
            };
            if let Err(e) = self.queue.enqueue(task) {
                error!(repayment_id = %repayment.id, error = %e, "failed to queue payment reminder");
                summary.error_count += 1;
            }
        }
        Ok(())
    }

    async fn overdue_pass(
        &self,
        options: &ReminderOptions,
        today: NaiveDate,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let overdue = self.repayments.due_before(today, &OVERDUE_STATUSES).await?;

        for repayment in overdue {
            summary.overdue_count += 1;
            let days_overdue = repayment.days_overdue(today);
            if options.simulate {
                debug!(repayment_id = %repayment.id, days_overdue, "would send overdue notification");
                continue;
            }
            if let Err(e) = self.escalate(&repayment, days_overdue).await {
                error!(repayment_id = %repayment.id, error = %e, "failed to process overdue repayment");
                summary.error_count += 1;
            }
        }
        Ok(())
    }

    async fn escalate(&self, repayment: &Repayment, days_overdue: i64) -> Result<()> {
        if repayment.status != RepaymentStatus::Overdue {
            self.repayments
                .set_status(repayment.id, RepaymentStatus::Overdue)
                .await?;
        }
        self.notifier
            .send_overdue_notification(repayment.id, days_overdue)
            .await
    }

    async fn stale_application_pass(
        &self,
        options: &ReminderOptions,
        today: NaiveDate,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let cutoff = today
            .checked_sub_days(Days::new(STALE_APPLICATION_AGE_DAYS))
            .unwrap_or(NaiveDate::MIN);
        let stale = self.applications.pending_created_before(cutoff).await?;

        for application in stale {
            summary.review_count += 1;
            if options.simulate {
                debug!(loan_id = %application.id, "would send review reminder");
                continue;
            }
            if let Err(e) = self.notifier.send_review_reminder(application.id).await {
                error!(loan_id = %application.id, error = %e, "failed to send review reminder");
                summary.error_count += 1;
            }
        }
        Ok(())
    }

    async fn send_digest(&self, run_date: NaiveDate, summary: &RunSummary) {
        let recipients = match self.users.active_admins().await {
            Ok(recipients) => recipients,
            Err(e) => {
                error!(error = %e, "failed to load digest recipients");
                return;
            }
        };
        if recipients.is_empty() {
            warn!("no active admins to receive the reminder digest");
            return;
        }

        let digest = Digest {
            run_date,
            upcoming: summary.upcoming_count,
            overdue: summary.overdue_count,
            review: summary.review_count,
            errors: summary.error_count,
        };
        if let Err(e) = self.notifier.send_digest(&recipients, &digest).await {
            error!(error = %e, recipients = recipients.len(), "failed to send reminder digest");
        }
    }
}
