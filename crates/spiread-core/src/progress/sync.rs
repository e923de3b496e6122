//! Hook for pushing progress to a remote account.

use super::store::ProgressStore;
use crate::error::Result;

/// Mirrors local progress to and from a remote account.
pub trait RemoteSync {
    fn push(&self, store: &ProgressStore, user_id: Option<&str>) -> Result<()>;
    fn pull(&self, store: &mut ProgressStore, user_id: Option<&str>) -> Result<()>;
}

/// Sync target used until a real remote exists. Logs and succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

impl RemoteSync for NoopSync {
    fn push(&self, _store: &ProgressStore, user_id: Option<&str>) -> Result<()> {
        tracing::info!(user_id, "cloud sync not implemented yet");
        Ok(())
    }

    fn pull(&self, _store: &mut ProgressStore, user_id: Option<&str>) -> Result<()> {
        tracing::info!(user_id, "cloud sync not implemented yet");
        Ok(())
    }
}
