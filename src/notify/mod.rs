//! Notification delivery abstraction.
//!
//! Finalization produces notification drafts; where they go is behind
//! the `NotificationSink` trait. The shipped sink writes them to the
//! store for the in-app feed; push or email channels can slot in
//! behind the same trait.

use crate::db::Repository;
use crate::domain::NotificationDraft;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Delivery seam for finalization notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync + fmt::Debug {
    /// Deliver one draft. Delivery is at-least-once from the caller's
    /// perspective; sinks must tolerate redelivery of equal drafts.
    async fn deliver(&self, draft: &NotificationDraft) -> Result<(), NotifyError>;
}

/// Sink that persists notifications for the in-app feed.
pub struct StoreSink {
    repo: Arc<Repository>,
}

impl StoreSink {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

impl fmt::Debug for StoreSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl NotificationSink for StoreSink {
    async fn deliver(&self, draft: &NotificationDraft) -> Result<(), NotifyError> {
        self.repo.insert_notification(draft, Utc::now()).await?;
        Ok(())
    }
}
