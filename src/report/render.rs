use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::filter::FilterSummary;

use super::{format_amount, Amount, AppliedFilters, ChildLine, Currency, ReportLine, ReportPayload};

#[derive(Tabled)]
struct AgeingRow {
    #[tabled(rename = "PARTNER")]
    partner: String,
    #[tabled(rename = "UNALLOCATED")]
    unallocated: String,
    #[tabled(rename = "0-30")]
    days_0_30: String,
    #[tabled(rename = "31-60")]
    days_31_60: String,
    #[tabled(rename = "61-90")]
    days_61_90: String,
    #[tabled(rename = "91-120")]
    days_91_120: String,
    #[tabled(rename = "121-180")]
    days_121_180: String,
    #[tabled(rename = "181-365")]
    days_181_365: String,
    #[tabled(rename = "365+")]
    days_365_plus: String,
    #[tabled(rename = "TOTAL")]
    total: String,
}

#[derive(Tabled)]
struct ChildRow {
    #[tabled(rename = "ENTRY")]
    entry: String,
    #[tabled(rename = "DATE")]
    date: String,
    #[tabled(rename = "JOURNAL")]
    journal: String,
    #[tabled(rename = "DEBIT")]
    debit: String,
    #[tabled(rename = "CREDIT")]
    credit: String,
    #[tabled(rename = "AMOUNT")]
    amount: String,
    #[tabled(rename = "PAID")]
    paid: String,
}

/// Render the report table. Every monetary field passes through the
/// currency formatter here, exactly once, before it reaches the table.
pub fn render_report(payload: &ReportPayload) -> String {
    let currency = &payload.currency;
    let mut rows: Vec<AgeingRow> = payload
        .report_lines
        .iter()
        .map(|line| AgeingRow {
            partner: line.name.clone(),
            unallocated: format_amount(&line.unallocated, currency),
            days_0_30: format_amount(&line.days_0_30.amount, currency),
            days_31_60: format_amount(&line.days_31_60.amount, currency),
            days_61_90: format_amount(&line.days_61_90.amount, currency),
            days_91_120: format_amount(&line.days_91_120.amount, currency),
            days_121_180: format_amount(&line.days_121_180.amount, currency),
            days_181_365: format_amount(&line.days_181_365.amount, currency),
            days_365_plus: format_amount(&line.days_365_plus.amount, currency),
            total: format_amount(&line.total, currency),
        })
        .collect();
    rows.push(totals_row(payload));

    Table::new(rows).with(Style::rounded()).to_string()
}

fn totals_row(payload: &ReportPayload) -> AgeingRow {
    let currency = &payload.currency;
    let sum = |pick: fn(&ReportLine) -> &Amount| -> Amount {
        Amount::Number(
            payload
                .report_lines
                .iter()
                .filter_map(|line| pick(line).as_number())
                .sum(),
        )
    };
    AgeingRow {
        partner: "TOTAL".to_string(),
        unallocated: format_amount(&sum(|line| &line.unallocated), currency),
        days_0_30: format_amount(&sum(|line| &line.days_0_30.amount), currency),
        days_31_60: format_amount(&sum(|line| &line.days_31_60.amount), currency),
        days_61_90: format_amount(&sum(|line| &line.days_61_90.amount), currency),
        days_91_120: format_amount(&sum(|line| &line.days_91_120.amount), currency),
        days_121_180: format_amount(&sum(|line| &line.days_121_180.amount), currency),
        days_181_365: format_amount(&sum(|line| &line.days_181_365.amount), currency),
        days_365_plus: format_amount(&sum(|line| &line.days_365_plus.amount), currency),
        total: format_amount(&sum(|line| &line.total), currency),
    }
}

/// Render the drill-down sub-table for one expanded partner line. The
/// first child row carries a marker to highlight it.
pub fn render_children(children: &[ChildLine], currency: &Currency) -> String {
    let rows: Vec<ChildRow> = children
        .iter()
        .enumerate()
        .map(|(i, child)| ChildRow {
            entry: if i == 0 {
                format!("> {} {}", child.code, child.name)
            } else {
                format!("  {} {}", child.code, child.name)
            },
            date: child.date.clone().unwrap_or_default(),
            journal: child.journal.clone().unwrap_or_default(),
            debit: format_amount(&child.debit, currency),
            credit: format_amount(&child.credit, currency),
            amount: format_amount(&child.amount, currency),
            paid: format_amount(&child.paid_amount, currency),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Render the filter toolbar block. Emitted on the initial render of a
/// view only; filter applies re-render the table body alone.
pub fn render_toolbar(
    summary: &FilterSummary,
    filters: &AppliedFilters,
    partner_choices: usize,
) -> String {
    let mut out = String::new();
    if let Some(company) = &filters.company_name {
        out.push_str(&format!("Company:      {company}\n"));
    }
    if let Some(date) = summary.date_from.or(filters.date_from) {
        out.push_str(&format!("Date from:    {date}\n"));
    }
    out.push_str(&format!("Partners:     {}\n", summary.partners_label()));
    out.push_str(&format!("Categories:   {}\n", summary.categories_label()));
    out.push_str(&format!("Target move:  {}\n", summary.target_move));
    out.push_str(&format!("Account type: {}\n", summary.result_selection));
    out.push_str(&format!(
        "Partners available: {partner_choices} (see 'ageing partners')"
    ));
    out
}
