use std::process::Command;

use crate::backend::{Backend, MOVE_MODEL};
use crate::error::{AgeingError, Result};
use crate::report::MoveId;

/// Host record viewer: opens the generic detail view for a model/record.
pub trait RecordViewer {
    fn open(&self, model: &str, id: MoveId) -> Result<()>;
}

/// Opens records in the host web client with the system default opener.
pub struct WebViewer {
    base_url: String,
}

impl WebViewer {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Detail-view URL for a record.
    pub fn record_url(&self, model: &str, id: MoveId) -> String {
        format!(
            "{}/web#model={}&id={}&view_type=form",
            self.base_url, model, id
        )
    }
}

impl RecordViewer for WebViewer {
    fn open(&self, model: &str, id: MoveId) -> Result<()> {
        open_target(&self.record_url(model, id))
    }
}

/// Resolves a clicked journal entry to a canonical record and opens the
/// host's detail view for it. The clicked identifier may be search-derived
/// or the backend's native id; the lookup result wins, the raw id is the
/// fallback.
pub struct NavigationBridge<'a> {
    backend: &'a dyn Backend,
    viewer: &'a dyn RecordViewer,
}

impl<'a> NavigationBridge<'a> {
    pub fn new(backend: &'a dyn Backend, viewer: &'a dyn RecordViewer) -> Self {
        Self { backend, viewer }
    }

    pub fn resolve(&self, clicked: MoveId) -> Result<MoveId> {
        let resolved = self
            .backend
            .lookup_move(clicked)
            .map_err(AgeingError::Fetch)?;
        Ok(resolved.unwrap_or(clicked))
    }

    pub fn open_journal_entry(&self, clicked: MoveId) -> Result<MoveId> {
        let id = self.resolve(clicked)?;
        self.viewer.open(MOVE_MODEL, id)?;
        Ok(id)
    }
}

/// Open a file or URL with the system default handler.
pub fn open_target(target: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        Command::new("open")
            .arg(target)
            .spawn()
            .map_err(AgeingError::Io)?;
    }

    #[cfg(target_os = "linux")]
    {
        Command::new("xdg-open")
            .arg(target)
            .spawn()
            .map_err(AgeingError::Io)?;
    }

    #[cfg(target_os = "windows")]
    {
        Command::new("cmd")
            .args(["/C", "start", "", target])
            .spawn()
            .map_err(AgeingError::Io)?;
    }

    Ok(())
}
