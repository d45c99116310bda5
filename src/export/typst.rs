use std::path::Path;
use std::process::Command;

use serde::Serialize;

use crate::error::{AgeingError, Result};
use crate::report::{AppliedFilters, Currency, ReportLine};

use super::{PdfAction, PdfRequest};

/// Embedded Typst template for the ageing report PDF.
/// Uses a placeholder that gets replaced with the actual JSON file path.
const AGEING_TEMPLATE: &str = r##"// Partner Ageing Report Template
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")
#let cur = data.currency

#set page(
  paper: "us-letter",
  flipped: true,
  margin: (top: 0.8in, bottom: 0.8in, left: 0.7in, right: 0.7in),
)

#set text(font: "Helvetica", size: 8pt)

#let fmt-int(digits) = {
  let len = digits.len()
  let out = ""
  for (i, digit) in digits.clusters().enumerate() {
    if i > 0 and calc.rem(len - i, 3) == 0 {
      out += ","
    }
    out += digit
  }
  out
}

#let fmt-number(amount) = {
  let rounded = calc.round(amount, digits: cur.decimal_places)
  let parts = str(rounded).split(".")
  let whole = parts.at(0)
  let neg = whole.starts-with("-")
  if neg { whole = whole.slice(1) }
  let frac = if parts.len() > 1 { parts.at(1) } else { "" }
  while frac.len() < cur.decimal_places { frac += "0" }
  let out = fmt-int(whole)
  if cur.decimal_places > 0 { out += "." + frac }
  if neg { out = "-" + out }
  out
}

#let fmt-amount(v) = {
  if type(v) == str { v } else {
    let n = fmt-number(v)
    if cur.symbol == "" { n } else if cur.position == "after" {
      n + " " + cur.symbol
    } else {
      cur.symbol + " " + n
    }
  }
}

#let opt(v) = if v == none { "" } else { v }

#let line-total(key) = data.report_lines.map(line => {
  let v = line.at(key)
  if type(v) == str { 0.0 } else { v }
}).sum(default: 0.0)

// Header with report title and applied filters
#grid(
  columns: (1fr, 1fr),
  align: (left, right),
  [
    #text(size: 16pt, weight: "bold")[#data.report_name]
    #v(0.3em)
    #if data.filters.company_name != none [
      #data.filters.company_name \
    ]
    #text(size: 9pt, fill: gray)[Generated #data.generated_date]
  ],
  [
    #table(
      columns: (auto, auto),
      stroke: none,
      align: (right, left),
      inset: 2pt,
      [*Partners:*], [#data.filters.partners.join(", ")],
      [*Categories:*], [#data.filters.partner_tags.join(", ")],
      [*Target move:*], [#data.filters.target_move],
      [*Account type:*], [#data.filters.result_selection],
      ..if data.filters.date_from != none {
        ([*Date from:*], [#data.filters.date_from])
      } else {
        ()
      },
    )
  ]
)

#v(1em)
#line(length: 100%, stroke: 0.5pt + gray)
#v(1em)

// Summary table, one row per partner
#table(
  columns: (2.2fr,) + ((1fr,) * 9),
  align: (left,) + ((right,) * 9),
  stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else { (bottom: 0.5pt + gray) },
  inset: 5pt,
  fill: (x, y) => if y == 0 { luma(240) } else { none },

  // Header
  [*Partner*], [*Unallocated*], [*0-30*], [*31-60*], [*61-90*], [*91-120*],
  [*121-180*], [*181-365*], [*365+*], [*Total*],

  // Rows
  ..data.report_lines.map(line => (
    line.name,
    [#fmt-amount(line.unalloc)],
    [#fmt-amount(line.at("6").amount)],
    [#fmt-amount(line.at("5").amount)],
    [#fmt-amount(line.at("4").amount)],
    [#fmt-amount(line.at("3").amount)],
    [#fmt-amount(line.at("2").amount)],
    [#fmt-amount(line.at("1").amount)],
    [#fmt-amount(line.at("0").amount)],
    [#fmt-amount(line.total)],
  )).flatten()
)

#v(1em)

// Totals
#align(right)[
  #table(
    columns: (auto, auto),
    stroke: none,
    align: (right, right),
    inset: 4pt,

    [Unallocated:], [#fmt-amount(line-total("unalloc"))],

    table.hline(stroke: 1pt),
    [*Total:*], [*#fmt-amount(line-total("total"))*],
  )
]

// Per-partner journal item detail
#for line in data.report_lines {
  if line.child_lines.len() > 0 {
    block(above: 1.4em, below: 0.4em, text(weight: "bold", size: 9pt)[#line.name])
    table(
      columns: (auto, 1fr, auto, auto, auto, auto, auto, auto),
      align: (left, left, left, left, right, right, right, right),
      stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else { (bottom: 0.5pt + gray) },
      inset: 4pt,
      fill: (x, y) => if y == 0 { luma(240) } else { none },

      [*Account*], [*Entry*], [*Date*], [*Journal*], [*Debit*], [*Credit*],
      [*Amount*], [*Paid*],

      ..line.child_lines.map(child => (
        child.code,
        child.name,
        opt(child.date),
        opt(child.journal),
        [#fmt-amount(child.debit)],
        [#fmt-amount(child.credit)],
        [#fmt-amount(child.amount)],
        [#fmt-amount(child.paid_amount)],
      )).flatten()
    )
  }
}
"##;

/// Everything the template consumes, serialized to the data JSON file.
#[derive(Serialize)]
struct PdfData<'a> {
    report_name: &'a str,
    template: &'a str,
    generated_date: String,
    currency: &'a Currency,
    filters: &'a AppliedFilters,
    report_lines: &'a [ReportLine],
}

/// PDF generator backed by the Typst CLI.
pub struct TypstPdfAction;

impl PdfAction for TypstPdfAction {
    fn run(&self, request: &PdfRequest, out: &Path) -> Result<()> {
        // Check if typst is available
        let typst_check = Command::new("typst").arg("--version").output();
        if typst_check.is_err() {
            return Err(AgeingError::TypstNotFound);
        }

        // Create temp directory for template
        let temp_dir = std::env::temp_dir().join("ageing-cli");
        std::fs::create_dir_all(&temp_dir)?;

        let data = PdfData {
            report_name: request.report_name,
            template: request.template,
            generated_date: chrono::Local::now().format("%B %d, %Y").to_string(),
            currency: &request.payload.currency,
            filters: &request.payload.filters,
            report_lines: &request.payload.report_lines,
        };
        let json_data =
            serde_json::to_string(&data).map_err(|e| AgeingError::Export(e.to_string()))?;

        // Write JSON to temp file
        let json_path = temp_dir.join("data.json");
        std::fs::write(&json_path, &json_data)?;

        // Write template with relative JSON path (data.json is in same directory)
        let template_content = AGEING_TEMPLATE.replace("DATA_JSON_PATH", "data.json");
        let template_path = temp_dir.join("ageing.typ");
        std::fs::write(&template_path, &template_content)?;

        // Run typst compile with root set to temp directory
        let output = Command::new("typst")
            .args([
                "compile",
                "--root",
                temp_dir.to_str().unwrap_or("."),
                template_path.to_str().unwrap_or(""),
                out.to_str().unwrap_or(""),
            ])
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AgeingError::Export(stderr.to_string()));
        }

        // Clean up temp files
        let _ = std::fs::remove_file(&template_path);
        let _ = std::fs::remove_file(&json_path);

        Ok(())
    }
}
