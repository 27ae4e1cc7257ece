use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::email::Mailer;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct MailJob {
    pub to: String,
    pub token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    #[error("mail queue is full")]
    Full,
    #[error("mail worker has stopped")]
    Closed,
}

/// Producer side of the mail queue. Dropping every clone stops the worker
/// once it has drained what is already queued.
#[derive(Clone)]
pub struct MailQueue {
    tx: mpsc::Sender<MailJob>,
}

impl MailQueue {
    /// Queue a job without waiting. A full queue fails the caller rather
    /// than stalling the request.
    pub fn enqueue(&self, job: MailJob) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

/// Start the delivery worker on the current runtime.
pub fn spawn(mailer: Arc<dyn Mailer>, capacity: usize) -> (MailQueue, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(run(mailer, rx));
    (MailQueue { tx }, handle)
}

/// How the worker ended when waited on at shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    Finished,
    Failed,
    TimedOut,
}

/// Wait up to `grace` for the worker to finish what is queued. Call after
/// every `MailQueue` has been dropped.
pub async fn drain(handle: JoinHandle<()>, grace: Duration) -> Drain {
    match tokio::time::timeout(grace, handle).await {
        Ok(Ok(())) => {
            tracing::info!("Mail queue drained");
            Drain::Finished
        }
        Ok(Err(e)) => {
            tracing::error!("Mail worker failed: {e}");
            Drain::Failed
        }
        Err(_) => {
            tracing::warn!(
                "Mail worker did not finish within {}s, abandoning queued emails",
                grace.as_secs()
            );
            Drain::TimedOut
        }
    }
}

async fn run(mailer: Arc<dyn Mailer>, mut rx: mpsc::Receiver<MailJob>) {
    tracing::info!("Mail worker started");

    while let Some(job) = rx.recv().await {
        deliver(mailer.as_ref(), &job).await;
    }

    tracing::info!("Mail worker stopped");
}

/// Send one job. Failures are logged and dropped; there is no retry.
async fn deliver(mailer: &dyn Mailer, job: &MailJob) {
    let send = mailer.send_password_reset(&job.to, &job.token);
    match tokio::time::timeout(SEND_TIMEOUT, send).await {
        Ok(Ok(())) => tracing::info!("Password reset email sent to {}", job.to),
        Ok(Err(e)) => tracing::error!("Failed to send password reset email to {}: {e}", job.to),
        Err(_) => tracing::error!(
            "Password reset email to {} timed out after {}s",
            job.to,
            SEND_TIMEOUT.as_secs()
        ),
    }
}
