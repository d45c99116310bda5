use std::collections::HashMap;

use super::PartnerId;

/// Expansion state of one partner row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowState {
    #[default]
    Collapsed,
    Expanded,
}

/// Per-row drill-down state, held here rather than inferred from the shape
/// of previously rendered output.
#[derive(Debug, Default)]
pub struct Drilldown {
    rows: HashMap<PartnerId, RowState>,
}

impl Drilldown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, partner: PartnerId) -> RowState {
        self.rows.get(&partner).copied().unwrap_or_default()
    }

    /// Attempt the Collapsed -> Expanded transition. Returns false when the
    /// row is already expanded, so rapid repeated activation of the same
    /// row cannot render its children twice.
    pub fn try_expand(&mut self, partner: PartnerId) -> bool {
        match self.state(partner) {
            RowState::Expanded => false,
            RowState::Collapsed => {
                self.rows.insert(partner, RowState::Expanded);
                true
            }
        }
    }

    /// Explicit Expanded -> Collapsed transition. Returns whether the row
    /// was expanded; the caller discards its child content.
    pub fn collapse(&mut self, partner: PartnerId) -> bool {
        self.rows.insert(partner, RowState::Collapsed) == Some(RowState::Expanded)
    }

    /// Collapse every row; used when the whole table re-renders.
    pub fn reset(&mut self) {
        self.rows.clear();
    }
}
