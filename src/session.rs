use crate::backend::{Backend, SessionId};
use crate::error::{AgeingError, Result};
use crate::filter::FilterCriteria;
use crate::report::ReportPayload;

/// Snapshot of a session's filter generation. A token issued before a
/// successful filter write is superseded; payloads fetched under it must
/// be discarded instead of installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken(u64);

/// One open report view's handle on the backend wizard resource. Owns the
/// session id and is not clonable, so a view cannot share its session
/// with another.
pub struct ReportSession<'a> {
    backend: &'a dyn Backend,
    id: SessionId,
    generation: u64,
}

impl<'a> ReportSession<'a> {
    /// Request a new backend-side filter resource. On failure nothing can
    /// render; callers must not proceed to load data.
    pub fn open(backend: &'a dyn Backend) -> Result<Self> {
        let id = backend.create().map_err(AgeingError::SessionCreate)?;
        tracing::debug!(%id, "report session opened");
        Ok(Self {
            backend,
            id,
            generation: 0,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn token(&self) -> RequestToken {
        RequestToken(self.generation)
    }

    /// Whether a payload fetched under `token` may still be installed.
    pub fn accept(&self, token: RequestToken) -> bool {
        token.0 == self.generation
    }

    /// Idempotent read of the current report state.
    pub fn fetch(&self) -> Result<ReportPayload> {
        self.backend.view_report(self.id).map_err(AgeingError::Fetch)
    }

    /// Persist new filter criteria. The backend acknowledges the write
    /// before this returns, so a subsequent fetch always observes it, and
    /// older request tokens are superseded. On failure the criteria remain
    /// unapplied and no re-fetch must follow.
    pub fn apply_filter(&mut self, criteria: &FilterCriteria) -> Result<()> {
        self.backend
            .write(self.id, criteria)
            .map_err(AgeingError::FilterPersist)?;
        self.generation += 1;
        Ok(())
    }
}
