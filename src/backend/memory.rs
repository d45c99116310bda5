use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::filter::{AccountType, FilterCriteria, PostingState};
use crate::report::{
    AppliedFilters, CategoryId, Currency, MoveId, PartnerChoice, ReportLine, ReportPayload,
    SymbolPosition,
};

use super::{Backend, BackendError, BackendResult, SessionId};

/// One partner's precomputed report line plus the attributes the filter
/// criteria match against. Bucket arithmetic is the real backend's
/// business; fixtures carry finished lines.
#[derive(Debug, Clone)]
pub struct PartnerFixture {
    pub line: ReportLine,
    pub categories: Vec<CategoryId>,
    pub posting_state: PostingState,
    pub account_type: AccountType,
}

/// In-memory stand-in for the remote backend, for tests and offline
/// development. Sessions are plain map entries; reads select the fixture
/// lines matching the session's criteria and echo the applied filters.
pub struct MemoryBackend {
    currency: Currency,
    company: String,
    categories: Vec<(CategoryId, String)>,
    fixtures: Vec<PartnerFixture>,
    sessions: RefCell<HashMap<SessionId, FilterCriteria>>,
    next_id: Cell<i64>,
}

impl MemoryBackend {
    pub fn new(fixtures: Vec<PartnerFixture>) -> Self {
        Self {
            currency: Currency::new("$", SymbolPosition::Before, 2),
            company: "Example Co".to_string(),
            categories: Vec::new(),
            fixtures,
            sessions: RefCell::new(HashMap::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn with_categories(mut self, categories: Vec<(CategoryId, String)>) -> Self {
        self.categories = categories;
        self
    }

    fn matches(fixture: &PartnerFixture, criteria: &FilterCriteria) -> bool {
        if !criteria.partner_ids.is_empty() {
            match fixture.line.partner_id {
                Some(id) if criteria.partner_ids.contains(&id) => {}
                _ => return false,
            }
        }
        if !criteria.partner_category_ids.is_empty()
            && !fixture
                .categories
                .iter()
                .any(|id| criteria.partner_category_ids.contains(id))
        {
            return false;
        }
        if criteria.target_move != PostingState::All
            && fixture.posting_state != criteria.target_move
        {
            return false;
        }
        fixture.account_type == criteria.result_selection
    }

    fn applied_filters(&self, criteria: &FilterCriteria, lines: &[ReportLine]) -> AppliedFilters {
        let partners = if criteria.partner_ids.is_empty() {
            vec!["All".to_string()]
        } else {
            lines.iter().map(|line| line.name.clone()).collect()
        };
        let categories = if criteria.partner_category_ids.is_empty() {
            vec!["All".to_string()]
        } else {
            self.categories
                .iter()
                .filter(|(id, _)| criteria.partner_category_ids.contains(id))
                .map(|(_, name)| name.clone())
                .collect()
        };

        AppliedFilters {
            date_from: criteria.date_from,
            partners,
            categories,
            target_move: criteria.target_move.label().to_string(),
            result_selection: criteria.result_selection.label().to_string(),
            category_list: self.categories.clone(),
            company_name: Some(self.company.clone()),
        }
    }
}

impl Backend for MemoryBackend {
    fn create(&self) -> BackendResult<SessionId> {
        let id = SessionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.sessions
            .borrow_mut()
            .insert(id, FilterCriteria::default());
        Ok(id)
    }

    fn write(&self, session: SessionId, criteria: &FilterCriteria) -> BackendResult<()> {
        let mut sessions = self.sessions.borrow_mut();
        let slot = sessions
            .get_mut(&session)
            .ok_or_else(|| BackendError::Rpc(format!("unknown session {session}")))?;
        *slot = criteria.clone();
        Ok(())
    }

    fn view_report(&self, session: SessionId) -> BackendResult<ReportPayload> {
        let sessions = self.sessions.borrow();
        let criteria = sessions
            .get(&session)
            .ok_or_else(|| BackendError::Rpc(format!("unknown session {session}")))?;

        let lines: Vec<ReportLine> = self
            .fixtures
            .iter()
            .filter(|fixture| Self::matches(fixture, criteria))
            .map(|fixture| fixture.line.clone())
            .collect();

        Ok(ReportPayload {
            name: "Partner Ageing".to_string(),
            currency: self.currency.clone(),
            filters: self.applied_filters(criteria, &lines),
            report_lines: lines,
        })
    }

    fn get_partners(&self) -> BackendResult<Vec<PartnerChoice>> {
        Ok(self
            .fixtures
            .iter()
            .filter_map(|fixture| {
                fixture.line.partner_id.map(|id| PartnerChoice {
                    id,
                    text: fixture.line.name.clone(),
                })
            })
            .collect())
    }

    fn lookup_move(&self, id: MoveId) -> BackendResult<Option<MoveId>> {
        let known = self.fixtures.iter().any(|fixture| {
            fixture
                .line
                .child_lines
                .iter()
                .any(|child| child.id == id)
        });
        Ok(known.then_some(id))
    }
}
