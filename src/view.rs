use crate::backend::Backend;
use crate::error::{AgeingError, Result};
use crate::filter::{FilterSelection, FilterSummary};
use crate::report::{
    render_children, render_report, render_toolbar, Drilldown, PartnerChoice, PartnerId,
    ReportPayload, RowState,
};
use crate::session::{ReportSession, RequestToken};

/// Output of one `render` call. The toolbar is present on the first
/// render of a view only; later renders refresh the table alone.
pub struct RenderedReport {
    pub toolbar: Option<String>,
    pub table: String,
}

/// One open report view: its session, drill-down state, the last-good
/// payload and the visible error state.
pub struct ReportView<'a> {
    session: ReportSession<'a>,
    backend: &'a dyn Backend,
    drilldown: Drilldown,
    current: Option<ReportPayload>,
    error: Option<String>,
    summary: FilterSummary,
    partner_choices: Option<Vec<PartnerChoice>>,
    toolbar_rendered: bool,
}

impl<'a> ReportView<'a> {
    /// Open a fresh session for this view. Session creation failure is
    /// fatal; no data can be loaded without a filter resource.
    pub fn open(backend: &'a dyn Backend) -> Result<Self> {
        let session = ReportSession::open(backend)?;
        Ok(Self {
            session,
            backend,
            drilldown: Drilldown::new(),
            current: None,
            error: None,
            summary: FilterSummary::default(),
            partner_choices: None,
            toolbar_rendered: false,
        })
    }

    pub fn session(&self) -> &ReportSession<'a> {
        &self.session
    }

    pub fn current(&self) -> Option<&ReportPayload> {
        self.current.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn summary(&self) -> &FilterSummary {
        &self.summary
    }

    pub fn row_state(&self, partner: PartnerId) -> RowState {
        self.drilldown.state(partner)
    }

    /// Partner picker options; fetched once per view, on first use.
    pub fn partner_choices(&mut self) -> Result<&[PartnerChoice]> {
        if self.partner_choices.is_none() {
            let choices = self.backend.get_partners().map_err(AgeingError::Fetch)?;
            self.partner_choices = Some(choices);
        }
        Ok(self.partner_choices.as_deref().unwrap_or_default())
    }

    /// Fetch the report and install it if still current. A failed fetch
    /// preserves the last-good payload and sets the visible error state.
    pub fn load(&mut self) -> Result<()> {
        let token = self.session.token();
        match self.session.fetch() {
            Ok(payload) => {
                if !self.install(token, payload) {
                    tracing::warn!("discarded stale report payload");
                }
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Install a fetched payload unless its token was superseded by a
    /// later filter write; stale payloads are discarded, never rendered.
    pub fn install(&mut self, token: RequestToken, payload: ReportPayload) -> bool {
        if !self.session.accept(token) {
            return false;
        }
        self.error = None;
        self.current = Some(payload);
        true
    }

    /// Apply a new filter selection: persist the criteria, then re-fetch.
    /// A failed persist leaves the accepted summary and the loaded payload
    /// untouched and triggers no fetch.
    pub fn apply(&mut self, selection: &FilterSelection) -> Result<()> {
        let criteria = selection.criteria()?;
        let summary = selection.summary()?;
        self.session.apply_filter(&criteria)?;
        self.summary = summary;
        self.drilldown.reset();
        self.load()
    }

    /// Expand one partner row and return its rendered child sub-table.
    /// Expanding an already-expanded row is a no-op (`Ok(None)`); on fetch
    /// failure or a vanished line the row rolls back to collapsed.
    pub fn expand(&mut self, partner: PartnerId) -> Result<Option<String>> {
        if !self.drilldown.try_expand(partner) {
            return Ok(None);
        }
        match self.fetch_children(partner) {
            Ok(table) => Ok(Some(table)),
            Err(err) => {
                self.drilldown.collapse(partner);
                Err(err)
            }
        }
    }

    /// Collapse an expanded row, discarding its child content. Returns
    /// whether the row was expanded.
    pub fn collapse(&mut self, partner: PartnerId) -> bool {
        self.drilldown.collapse(partner)
    }

    // No partial-fetch API exists, so expansion re-reads the full report
    // and formats only the matching line's children, with the currency
    // taken from that same response.
    fn fetch_children(&self, partner: PartnerId) -> Result<String> {
        let payload = self.session.fetch()?;
        let line = payload
            .line_for(partner)
            .ok_or(AgeingError::PartnerLineNotFound(partner))?;
        Ok(render_children(&line.child_lines, &payload.currency))
    }

    /// Render the current payload. The filter toolbar is included on the
    /// first render of this view only.
    pub fn render(&mut self) -> Option<RenderedReport> {
        let payload = self.current.as_ref()?;
        let toolbar = if self.toolbar_rendered {
            None
        } else {
            self.toolbar_rendered = true;
            let choices = self.partner_choices.as_deref().map_or(0, |c| c.len());
            Some(render_toolbar(&self.summary, &payload.filters, choices))
        };
        Some(RenderedReport {
            toolbar,
            table: render_report(payload),
        })
    }
}
