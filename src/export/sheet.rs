use std::path::Path;

use crate::error::{AgeingError, Result};
use crate::report::{Amount, ChildLine, BUCKET_LABELS};

use super::{SheetAction, SheetRequest};

/// Spreadsheet generator writing the ageing workbook as CSV: a summary
/// section (filter block, bucket columns with amount/duty/tax, totals row,
/// period percentage breakdown) followed by a per-partner detail section.
pub struct CsvSheetAction;

impl SheetAction for CsvSheetAction {
    fn output_format(&self) -> &'static str {
        "csv"
    }

    fn run(&self, request: &SheetRequest, out: &Path) -> Result<()> {
        // Built fully in memory and written once, so a failed export
        // leaves no partial file behind.
        let bytes = write_workbook(request).map_err(|e| AgeingError::Export(e.to_string()))?;
        std::fs::write(out, bytes)?;
        Ok(())
    }
}

fn cell(amount: &Amount, decimal_places: u32) -> String {
    match amount {
        Amount::Number(n) => format!("{:.*}", decimal_places as usize, n),
        Amount::Text(s) => s.clone(),
    }
}

fn numeric(amount: &Amount) -> f64 {
    amount.as_number().unwrap_or(0.0)
}

fn write_workbook(request: &SheetRequest) -> std::result::Result<Vec<u8>, csv::Error> {
    let payload = request.payload;
    let filters = &payload.filters;
    let decimals = payload.currency.decimal_places;

    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    // Filter block
    wtr.write_record([format!("{} - Summary", request.report_name)])?;
    if let Some(date) = filters.date_from {
        wtr.write_record(["Date from".to_string(), date.to_string()])?;
    }
    wtr.write_record(["Account Type".to_string(), filters.result_selection.clone()])?;
    wtr.write_record(["Target Moves".to_string(), filters.target_move.clone()])?;
    wtr.write_record(["Partners".to_string(), filters.partners.join(", ")])?;
    wtr.write_record(["Partner Tags".to_string(), filters.categories.join(", ")])?;
    wtr.write_record::<[&str; 0], &str>([])?;

    // Summary header: each bucket gets amount, duty and tax columns
    let mut header = vec!["Partner".to_string(), "Unallocated".to_string()];
    for label in BUCKET_LABELS {
        header.push(label.to_string());
        header.push(format!("{label} Duty"));
        header.push(format!("{label} Tax"));
    }
    header.push("Total".to_string());
    wtr.write_record(&header)?;

    // Summary rows plus running bucket totals
    let mut bucket_totals = [[0.0f64; 3]; 7];
    let mut unallocated_total = 0.0f64;
    let mut grand_total = 0.0f64;

    for line in &payload.report_lines {
        let mut record = vec![line.name.clone(), cell(&line.unallocated, decimals)];
        unallocated_total += numeric(&line.unallocated);
        for (i, (_, bucket)) in line.buckets().iter().enumerate() {
            record.push(cell(&bucket.amount, decimals));
            record.push(cell(&bucket.duty_amount, decimals));
            record.push(cell(&bucket.vat_amount, decimals));
            bucket_totals[i][0] += numeric(&bucket.amount);
            bucket_totals[i][1] += numeric(&bucket.duty_amount);
            bucket_totals[i][2] += numeric(&bucket.vat_amount);
        }
        record.push(cell(&line.total, decimals));
        grand_total += numeric(&line.total);
        wtr.write_record(&record)?;
    }

    let mut totals = vec![
        "Total".to_string(),
        cell(&Amount::Number(unallocated_total), decimals),
    ];
    for columns in &bucket_totals {
        for value in columns {
            totals.push(cell(&Amount::Number(*value), decimals));
        }
    }
    totals.push(cell(&Amount::Number(grand_total), decimals));
    wtr.write_record(&totals)?;

    // Period percentage breakdown
    wtr.write_record::<[&str; 0], &str>([])?;
    wtr.write_record(["Period", "Amount", "%"])?;
    let due_total = grand_total - unallocated_total;
    for (i, label) in BUCKET_LABELS.iter().enumerate() {
        let due = bucket_totals[i][0];
        let percent = if due_total.abs() > f64::EPSILON {
            due / due_total * 100.0
        } else {
            0.0
        };
        wtr.write_record([
            label.to_string(),
            cell(&Amount::Number(due), decimals),
            format!("{percent:.2}"),
        ])?;
    }
    wtr.write_record([
        "Total".to_string(),
        cell(&Amount::Number(grand_total), decimals),
    ])?;
    wtr.write_record([
        "Unallocated".to_string(),
        cell(&Amount::Number(unallocated_total), decimals),
    ])?;

    // Detail section, one block per partner with journal items
    wtr.write_record::<[&str; 0], &str>([])?;
    wtr.write_record([format!("{} - Detail", request.report_name)])?;
    wtr.write_record([
        "Partner", "Account", "Entry", "Date", "Journal", "Debit", "Credit", "Amount", "Paid",
    ])?;
    for line in &payload.report_lines {
        for child in &line.child_lines {
            wtr.write_record([
                line.name.clone(),
                child.code.clone(),
                child.name.clone(),
                child.date.clone().unwrap_or_default(),
                child.journal.clone().unwrap_or_default(),
                cell(&child.debit, decimals),
                cell(&child.credit, decimals),
                cell(&child.amount, decimals),
                cell(&child.paid_amount, decimals),
            ])?;
        }
        if !line.child_lines.is_empty() {
            wtr.write_record([
                format!("{} Total", line.name),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                cell(&sum_children(&line.child_lines, |c| &c.debit), decimals),
                cell(&sum_children(&line.child_lines, |c| &c.credit), decimals),
                cell(&sum_children(&line.child_lines, |c| &c.amount), decimals),
                cell(
                    &sum_children(&line.child_lines, |c| &c.paid_amount),
                    decimals,
                ),
            ])?;
        }
    }

    wtr.flush().map_err(csv::Error::from)?;
    wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

fn sum_children(children: &[ChildLine], pick: fn(&ChildLine) -> &Amount) -> Amount {
    Amount::Number(children.iter().map(|child| numeric(pick(child))).sum())
}
