use crate::application::queue::ReminderTask;
use crate::domain::ports::NotifierRef;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Drains the reminder queue and hands each task to the notifier.
pub struct ReminderWorker;

impl ReminderWorker {
    /// Spawns the worker. The task ends once every queue handle is dropped
    /// and resolves to the number of reminders delivered.
    pub fn spawn(mut receiver: mpsc::UnboundedReceiver<ReminderTask>, notifier: NotifierRef) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut delivered = 0;
            while let Some(task) = receiver.recv().await {
                match task {
                    ReminderTask::PaymentReminder { repayment_id } => {
                        match notifier.send_payment_reminder(repayment_id).await {
                            Ok(()) => {
                                delivered += 1;
                                debug!(%repayment_id, "payment reminder delivered");
                            }
                            Err(e) => warn!(%repayment_id, error = %e, "payment reminder delivery failed"),
                        }
                    }
                }
            }
            delivered
        })
    }
}
