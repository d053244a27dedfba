use crate::error::{LoanOpsError, Result};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Work handed off to the reminder worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderTask {
    PaymentReminder { repayment_id: Uuid },
}

/// Fire-and-forget producer side of the reminder work queue.
#[derive(Debug, Clone)]
pub struct ReminderQueue {
    sender: mpsc::UnboundedSender<ReminderTask>,
}

impl ReminderQueue {
    /// Creates a queue and the receiver a worker drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ReminderTask>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Enqueues without waiting; fails only once the receiver is gone.
    pub fn enqueue(&self, task: ReminderTask) -> Result<()> {
        self.sender
            .send(task)
            .map_err(|_| LoanOpsError::QueueClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_and_drain() {
        let (queue, mut rx) = ReminderQueue::channel();
        let id = Uuid::new_v4();
        queue
            .enqueue(ReminderTask::PaymentReminder { repayment_id: id })
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(ReminderTask::PaymentReminder { repayment_id: id })
        );
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (queue, rx) = ReminderQueue::channel();
        drop(rx);
        let result = queue.enqueue(ReminderTask::PaymentReminder {
            repayment_id: Uuid::new_v4(),
        });
        assert!(matches!(result, Err(LoanOpsError::QueueClosed)));
    }
}
