mod drill;
mod format;
mod render;

pub use drill::{Drilldown, RowState};
pub use format::format_amount;
pub use render::{render_children, render_report, render_toolbar};

use std::fmt;

use chrono::NaiveDate;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Partner identifier. Ids coming off the wire are normalized into this
/// once, at the decode boundary; everything else compares typed ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerId(pub i64);

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partner category (tag) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Journal entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveId(pub i64);

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monetary value as supplied by the backend: usually a raw number, but
/// the contract allows pre-formatted display strings, which the formatter
/// passes through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(*n),
            Amount::Text(_) => None,
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Number(0.0)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

/// Where the currency symbol sits relative to the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    #[default]
    Before,
    After,
}

/// Currency descriptor for one report fetch. The backend sends it as a
/// `[symbol, position, lang, decimal_places]` array; the lang element is
/// not consumed. Always taken from the latest response so a currency
/// change on the backend is never masked by a cached descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Currency {
    pub symbol: String,
    pub position: SymbolPosition,
    pub decimal_places: u32,
}

impl Currency {
    pub fn new(symbol: &str, position: SymbolPosition, decimal_places: u32) -> Self {
        Self {
            symbol: symbol.to_string(),
            position,
            decimal_places,
        }
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct CurrencyVisitor;

        impl<'de> Visitor<'de> for CurrencyVisitor {
            type Value = Currency;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [symbol, position, lang, decimal_places] array")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Currency, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let symbol: Option<String> = seq
                    .next_element::<Option<String>>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let position: SymbolPosition = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let _lang: Option<String> = seq
                    .next_element::<Option<String>>()?
                    .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                let decimal_places: u32 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(3, &self))?;
                while seq.next_element::<de::IgnoredAny>()?.is_some() {}
                Ok(Currency {
                    symbol: symbol.unwrap_or_default(),
                    position,
                    decimal_places,
                })
            }
        }

        deserializer.deserialize_seq(CurrencyVisitor)
    }
}

/// One time-windowed ageing bucket. A missing bucket key in the payload is
/// a backend contract violation and fails decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AgeingBucket {
    pub amount: Amount,
    pub duty_amount: Amount,
    pub vat_amount: Amount,
}

/// Bucket display labels, newest first, matching the wire keys "6".."0".
pub const BUCKET_LABELS: [&str; 7] = [
    "0-30", "31-60", "61-90", "91-120", "121-180", "181-365", "365+",
];

/// One journal item under an expanded partner line. Fetched with its
/// parent's expansion and discarded again on collapse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildLine {
    pub id: MoveId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub debit: Amount,
    #[serde(default)]
    pub credit: Amount,
    pub amount: Amount,
    pub paid_amount: Amount,
}

/// One row per partner. The backend reports unknown-partner activity as a
/// row without a partner id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLine {
    #[serde(default, deserialize_with = "partner_ref")]
    pub partner_id: Option<PartnerId>,
    pub name: String,
    #[serde(rename = "6")]
    pub days_0_30: AgeingBucket,
    #[serde(rename = "5")]
    pub days_31_60: AgeingBucket,
    #[serde(rename = "4")]
    pub days_61_90: AgeingBucket,
    #[serde(rename = "3")]
    pub days_91_120: AgeingBucket,
    #[serde(rename = "2")]
    pub days_121_180: AgeingBucket,
    #[serde(rename = "1")]
    pub days_181_365: AgeingBucket,
    #[serde(rename = "0")]
    pub days_365_plus: AgeingBucket,
    pub total: Amount,
    pub direction: Amount,
    #[serde(rename = "unalloc")]
    pub unallocated: Amount,
    #[serde(default)]
    pub child_lines: Vec<ChildLine>,
}

impl ReportLine {
    /// Buckets newest first, paired with their display label.
    pub fn buckets(&self) -> [(&'static str, &AgeingBucket); 7] {
        [
            (BUCKET_LABELS[0], &self.days_0_30),
            (BUCKET_LABELS[1], &self.days_31_60),
            (BUCKET_LABELS[2], &self.days_61_90),
            (BUCKET_LABELS[3], &self.days_91_120),
            (BUCKET_LABELS[4], &self.days_121_180),
            (BUCKET_LABELS[5], &self.days_181_365),
            (BUCKET_LABELS[6], &self.days_365_plus),
        ]
    }
}

/// The backend reports rows without a partner as `false`; normalize that
/// to `None` here so the rest of the crate only sees typed ids.
fn partner_ref<'de, D>(deserializer: D) -> Result<Option<PartnerId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Id(i64),
        Absent(bool),
    }

    let raw: Option<Raw> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(Raw::Id(id)) => Some(PartnerId(id)),
        _ => None,
    })
}

/// Backend echo of the accepted filter state, as display labels, plus the
/// category picker options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFilters {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub partners: Vec<String>,
    #[serde(default, rename = "partner_tags")]
    pub categories: Vec<String>,
    pub target_move: String,
    pub result_selection: String,
    #[serde(default)]
    pub category_list: Vec<(CategoryId, String)>,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// One entry of the partner picker, as returned by `get_partners`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerChoice {
    pub id: PartnerId,
    pub text: String,
}

/// Everything one `view_report` fetch returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub name: String,
    pub currency: Currency,
    pub filters: AppliedFilters,
    pub report_lines: Vec<ReportLine>,
}

impl ReportPayload {
    /// Locate a partner's line by strict typed-id equality.
    pub fn line_for(&self, partner: PartnerId) -> Option<&ReportLine> {
        self.report_lines
            .iter()
            .find(|line| line.partner_id == Some(partner))
    }
}
