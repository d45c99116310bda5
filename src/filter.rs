use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AgeingError, Result};
use crate::report::{CategoryId, PartnerId};

/// Posting state of the journal entries included in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostingState {
    Draft,
    #[default]
    Posted,
    All,
}

impl PostingState {
    /// Central fallback: an empty control value means posted entries. Every
    /// consumer resolves through here so the summary shown on screen and
    /// the payload sent to the backend cannot disagree.
    pub fn from_control(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "posted" => Ok(PostingState::Posted),
            "draft" => Ok(PostingState::Draft),
            "all" => Ok(PostingState::All),
            _ => Err(AgeingError::InvalidPostingState(value.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PostingState::Draft => "Draft",
            PostingState::Posted => "Posted",
            PostingState::All => "All",
        }
    }
}

/// Which side of the ledger the report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Customer,
    Supplier,
}

impl AccountType {
    /// Central fallback: an empty control value means customer accounts.
    pub fn from_control(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "customer" => Ok(AccountType::Customer),
            "supplier" => Ok(AccountType::Supplier),
            _ => Err(AgeingError::InvalidAccountType(value.to_string())),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountType::Customer => "Receivable",
            AccountType::Supplier => "Payable",
        }
    }
}

/// Canonical filter payload written to the report session. An immutable
/// snapshot; empty id sets mean "no restriction".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    pub partner_ids: BTreeSet<PartnerId>,
    pub partner_category_ids: BTreeSet<CategoryId>,
    pub target_move: PostingState,
    pub result_selection: AccountType,
}

/// One selectable entry of a multi-select filter control.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice<Id> {
    pub id: Id,
    pub label: String,
    pub selected: bool,
}

/// Raw per-dimension filter selections. Both the criteria payload and the
/// on-screen summary derive from this one place.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub date_from: Option<NaiveDate>,
    pub partners: Vec<Choice<PartnerId>>,
    pub categories: Vec<Choice<CategoryId>>,
    pub target_move: String,
    pub result_selection: String,
}

impl FilterSelection {
    /// Collect the selected choices into a criteria snapshot. Ids are
    /// de-duplicated by the set collection; an empty selection clears the
    /// corresponding criterion.
    pub fn criteria(&self) -> Result<FilterCriteria> {
        Ok(FilterCriteria {
            date_from: self.date_from,
            partner_ids: self
                .partners
                .iter()
                .filter(|choice| choice.selected)
                .map(|choice| choice.id)
                .collect(),
            partner_category_ids: self
                .categories
                .iter()
                .filter(|choice| choice.selected)
                .map(|choice| choice.id)
                .collect(),
            target_move: PostingState::from_control(&self.target_move)?,
            result_selection: AccountType::from_control(&self.result_selection)?,
        })
    }

    /// Display labels per filter dimension, recomputed fresh on every
    /// apply; nothing accumulates across applies.
    pub fn summary(&self) -> Result<FilterSummary> {
        Ok(FilterSummary {
            date_from: self.date_from,
            partners: joined_labels(&self.partners),
            categories: joined_labels(&self.categories),
            target_move: PostingState::from_control(&self.target_move)?.label(),
            result_selection: AccountType::from_control(&self.result_selection)?.label(),
        })
    }
}

fn joined_labels<Id>(choices: &[Choice<Id>]) -> String {
    let mut labels: Vec<&str> = Vec::new();
    for choice in choices.iter().filter(|choice| choice.selected) {
        if !labels.contains(&choice.label.as_str()) {
            labels.push(&choice.label);
        }
    }
    labels.join(", ")
}

/// Human-readable summary of the accepted filter state. Presentation
/// state only; never part of the criteria payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSummary {
    pub date_from: Option<NaiveDate>,
    pub partners: String,
    pub categories: String,
    pub target_move: &'static str,
    pub result_selection: &'static str,
}

impl FilterSummary {
    pub fn partners_label(&self) -> &str {
        if self.partners.is_empty() {
            "All"
        } else {
            &self.partners
        }
    }

    pub fn categories_label(&self) -> &str {
        if self.categories.is_empty() {
            "All"
        } else {
            &self.categories
        }
    }
}

impl Default for FilterSummary {
    fn default() -> Self {
        Self {
            date_from: None,
            partners: String::new(),
            categories: String::new(),
            target_move: PostingState::default().label(),
            result_selection: AccountType::default().label(),
        }
    }
}
