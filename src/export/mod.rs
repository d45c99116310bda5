mod sheet;
mod typst;

pub use sheet::CsvSheetAction;
pub use typst::TypstPdfAction;

use std::path::Path;

use crate::error::{AgeingError, Result};
use crate::report::ReportPayload;
use crate::session::ReportSession;

/// Display name handed to the document generators.
pub const REPORT_NAME: &str = "Partner Ageing";

/// Template identifier for the PDF pipeline.
pub const PDF_TEMPLATE: &str = "partner_ageing_soa";

/// Full payload plus metadata for the PDF generator.
pub struct PdfRequest<'a> {
    pub report_name: &'a str,
    pub template: &'a str,
    pub payload: &'a ReportPayload,
}

/// Spreadsheet request: the filter options and report lines travel as
/// independently serialized blobs alongside the payload itself.
pub struct SheetRequest<'a> {
    pub report_name: &'a str,
    pub options: String,
    pub report_data: String,
    pub output_format: &'static str,
    pub payload: &'a ReportPayload,
}

/// Host PDF document generator.
pub trait PdfAction {
    fn run(&self, request: &PdfRequest, out: &Path) -> Result<()>;
}

/// Host spreadsheet document generator.
pub trait SheetAction {
    fn output_format(&self) -> &'static str;
    fn run(&self, request: &SheetRequest, out: &Path) -> Result<()>;
}

/// Build the spreadsheet request for a fetched payload.
pub fn sheet_request<'a>(
    payload: &'a ReportPayload,
    output_format: &'static str,
) -> Result<SheetRequest<'a>> {
    Ok(SheetRequest {
        report_name: REPORT_NAME,
        options: serde_json::to_string(&payload.filters)
            .map_err(|e| AgeingError::Export(e.to_string()))?,
        report_data: serde_json::to_string(&payload.report_lines)
            .map_err(|e| AgeingError::Export(e.to_string()))?,
        output_format,
        payload,
    })
}

/// Forwards the currently loaded dataset to the host document generators.
/// Fire and forget: no progress or cancel semantics; the generator owns
/// the rest of the pipeline, and a failed export produces no file.
pub struct ExportDispatcher<'a> {
    pdf: &'a dyn PdfAction,
    sheet: &'a dyn SheetAction,
}

impl<'a> ExportDispatcher<'a> {
    pub fn new(pdf: &'a dyn PdfAction, sheet: &'a dyn SheetAction) -> Self {
        Self { pdf, sheet }
    }

    /// Fetch the current report payload and hand it to the PDF generator.
    /// A failed fetch propagates to the caller.
    pub fn export_pdf(&self, session: &ReportSession, out: &Path) -> Result<()> {
        let payload = session.fetch()?;
        let request = PdfRequest {
            report_name: REPORT_NAME,
            template: PDF_TEMPLATE,
            payload: &payload,
        };
        self.pdf.run(&request, out)
    }

    /// Fetch the current report payload and hand it to the spreadsheet
    /// generator together with the serialized filter and line blobs.
    pub fn export_sheet(&self, session: &ReportSession, out: &Path) -> Result<()> {
        let payload = session.fetch()?;
        let request = sheet_request(&payload, self.sheet.output_format())?;
        self.sheet.run(&request, out)
    }
}
