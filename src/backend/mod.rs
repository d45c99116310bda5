mod http;
mod memory;

pub use http::HttpBackend;
pub use memory::{MemoryBackend, PartnerFixture};

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::FilterCriteria;
use crate::report::{MoveId, PartnerChoice, ReportPayload};

/// RPC model name of the report wizard resource.
pub const REPORT_MODEL: &str = "account.partner.ageing.soa";

/// RPC model name of a journal entry record.
pub const MOVE_MODEL: &str = "account.move";

/// Server-side wizard resource handle; one per open report view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub i64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport-level failures, kept separate from the view error taxonomy.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("transport error: {0}")]
    Transport(#[from] ureq::Error),

    #[error("backend fault: {0}")]
    Rpc(String),

    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("empty result in response")]
    EmptyResult,
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Remote accounting backend serving the ageing report. The production
/// implementation speaks the host's RPC endpoint; tests run against the
/// in-memory fixture backend.
pub trait Backend {
    /// Request a new wizard resource holding default filter criteria.
    fn create(&self) -> BackendResult<SessionId>;

    /// Persist filter criteria to the wizard resource. The backend
    /// acknowledges the write before this returns.
    fn write(&self, session: SessionId, criteria: &FilterCriteria) -> BackendResult<()>;

    /// Read the report for the session's current filter state. Safe to
    /// call repeatedly.
    fn view_report(&self, session: SessionId) -> BackendResult<ReportPayload>;

    /// Partner picker options; independent of any session.
    fn get_partners(&self) -> BackendResult<Vec<PartnerChoice>>;

    /// Resolve a journal entry id to a canonical record id, if the backend
    /// knows it.
    fn lookup_move(&self, id: MoveId) -> BackendResult<Option<MoveId>>;
}
