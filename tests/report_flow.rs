use std::cell::{Cell, RefCell};
use std::path::Path;

use tempfile::TempDir;

use ageing::backend::{
    Backend, BackendError, BackendResult, MemoryBackend, PartnerFixture, SessionId,
};
use ageing::error::AgeingError;
use ageing::export::{
    sheet_request, CsvSheetAction, ExportDispatcher, PdfAction, PdfRequest, SheetAction,
    SheetRequest,
};
use ageing::filter::{AccountType, Choice, FilterCriteria, FilterSelection, PostingState};
use ageing::report::{
    AgeingBucket, Amount, CategoryId, ChildLine, Currency, MoveId, PartnerChoice, PartnerId,
    ReportLine, ReportPayload, RowState, SymbolPosition,
};
use ageing::session::ReportSession;
use ageing::view::ReportView;

fn bucket(amount: f64) -> AgeingBucket {
    AgeingBucket {
        amount: amount.into(),
        duty_amount: Amount::default(),
        vat_amount: Amount::default(),
    }
}

fn line(partner: i64, name: &str, current: f64, overdue: f64) -> ReportLine {
    ReportLine {
        partner_id: Some(PartnerId(partner)),
        name: name.to_string(),
        days_0_30: bucket(current),
        days_31_60: AgeingBucket::default(),
        days_61_90: AgeingBucket::default(),
        days_91_120: AgeingBucket::default(),
        days_121_180: AgeingBucket::default(),
        days_181_365: AgeingBucket::default(),
        days_365_plus: bucket(overdue),
        total: Amount::Number(current + overdue),
        direction: Amount::default(),
        unallocated: Amount::default(),
        child_lines: vec![ChildLine {
            id: MoveId(partner * 100 + 1),
            code: "AR".to_string(),
            name: format!("INV/{partner}"),
            date: Some("01/06/2026".to_string()),
            journal: Some("Sales".to_string()),
            debit: Amount::Number(current),
            credit: Amount::default(),
            amount: Amount::Number(current),
            paid_amount: Amount::default(),
        }],
    }
}

fn fixture(partner: i64, name: &str, current: f64, overdue: f64, category: i64) -> PartnerFixture {
    PartnerFixture {
        line: line(partner, name, current, overdue),
        categories: vec![CategoryId(category)],
        posting_state: PostingState::Posted,
        account_type: AccountType::Customer,
    }
}

fn sample_backend() -> MemoryBackend {
    MemoryBackend::new(vec![
        fixture(7, "Acme Industries", 150.0, 30.0, 1),
        fixture(8, "Globex", 20.0, 0.0, 2),
    ])
    .with_categories(vec![
        (CategoryId(1), "Wholesale".to_string()),
        (CategoryId(2), "Retail".to_string()),
    ])
}

fn selection_for_partner(backend: &MemoryBackend, partner: i64) -> FilterSelection {
    let choices = backend.get_partners().unwrap();
    FilterSelection {
        partners: choices
            .iter()
            .map(|choice| Choice {
                id: choice.id,
                label: choice.text.clone(),
                selected: choice.id == PartnerId(partner),
            })
            .collect(),
        ..Default::default()
    }
}

#[test]
fn filter_round_trip_scopes_report() {
    let backend = sample_backend();
    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();
    assert_eq!(view.current().unwrap().report_lines.len(), 2);

    let mut selection = selection_for_partner(&backend, 7);
    selection.target_move = "posted".to_string();
    view.apply(&selection).unwrap();

    let payload = view.current().unwrap();
    assert_eq!(payload.report_lines.len(), 1);
    assert_eq!(payload.report_lines[0].partner_id, Some(PartnerId(7)));
    assert_eq!(payload.filters.partners, vec!["Acme Industries".to_string()]);
    assert_eq!(payload.filters.target_move, "Posted");
    assert_eq!(view.summary().partners_label(), "Acme Industries");
}

#[test]
fn empty_selection_clears_criteria() {
    let backend = sample_backend();
    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();

    let mut selection = selection_for_partner(&backend, 7);
    view.apply(&selection).unwrap();
    assert_eq!(view.current().unwrap().report_lines.len(), 1);

    // Deselecting everything resets the criterion, it does not keep the
    // previous restriction.
    for choice in &mut selection.partners {
        choice.selected = false;
    }
    view.apply(&selection).unwrap();
    assert_eq!(view.current().unwrap().report_lines.len(), 2);
    assert_eq!(view.summary().partners_label(), "All");
}

#[test]
fn category_filter_scopes_report() {
    let backend = sample_backend();
    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();

    let selection = FilterSelection {
        categories: vec![Choice {
            id: CategoryId(2),
            label: "Retail".to_string(),
            selected: true,
        }],
        ..Default::default()
    };
    view.apply(&selection).unwrap();

    let payload = view.current().unwrap();
    assert_eq!(payload.report_lines.len(), 1);
    assert_eq!(payload.report_lines[0].name, "Globex");
    assert_eq!(payload.filters.categories, vec!["Retail".to_string()]);
}

#[test]
fn posting_state_defaults_to_posted() {
    let mut draft = fixture(9, "Initech", 40.0, 0.0, 1);
    draft.posting_state = PostingState::Draft;

    let backend = MemoryBackend::new(vec![fixture(7, "Acme Industries", 150.0, 30.0, 1), draft]);
    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();
    assert_eq!(view.current().unwrap().report_lines.len(), 1);

    let selection = FilterSelection {
        target_move: "all".to_string(),
        ..Default::default()
    };
    view.apply(&selection).unwrap();
    assert_eq!(view.current().unwrap().report_lines.len(), 2);
}

#[test]
fn sessions_are_isolated() {
    let backend = sample_backend();
    let mut first = ReportSession::open(&backend).unwrap();
    let second = ReportSession::open(&backend).unwrap();
    assert_ne!(first.id(), second.id());

    let criteria = FilterCriteria {
        partner_ids: [PartnerId(7)].into_iter().collect(),
        ..Default::default()
    };
    first.apply_filter(&criteria).unwrap();

    assert_eq!(first.fetch().unwrap().report_lines.len(), 1);
    assert_eq!(second.fetch().unwrap().report_lines.len(), 2);
}

#[test]
fn stale_tokens_are_superseded() {
    let backend = sample_backend();
    let mut session = ReportSession::open(&backend).unwrap();

    let token = session.token();
    assert!(session.accept(token));

    session.apply_filter(&FilterCriteria::default()).unwrap();
    assert!(!session.accept(token));
    assert!(session.accept(session.token()));
}

#[test]
fn stale_payload_is_not_installed() {
    let backend = sample_backend();
    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();

    let token = view.session().token();
    let stale_payload = view.session().fetch().unwrap();

    view.apply(&selection_for_partner(&backend, 7)).unwrap();
    assert!(!view.install(token, stale_payload));
    assert_eq!(view.current().unwrap().report_lines.len(), 1);
}

struct FailingWrites<'a> {
    inner: &'a MemoryBackend,
    fetches: Cell<usize>,
}

impl Backend for FailingWrites<'_> {
    fn create(&self) -> BackendResult<SessionId> {
        self.inner.create()
    }

    fn write(&self, _session: SessionId, _criteria: &FilterCriteria) -> BackendResult<()> {
        Err(BackendError::Rpc("disk full".to_string()))
    }

    fn view_report(&self, session: SessionId) -> BackendResult<ReportPayload> {
        self.fetches.set(self.fetches.get() + 1);
        self.inner.view_report(session)
    }

    fn get_partners(&self) -> BackendResult<Vec<PartnerChoice>> {
        self.inner.get_partners()
    }

    fn lookup_move(&self, id: MoveId) -> BackendResult<Option<MoveId>> {
        self.inner.lookup_move(id)
    }
}

#[test]
fn failed_persist_keeps_prior_state_and_skips_refetch() {
    let memory = sample_backend();
    let backend = FailingWrites {
        inner: &memory,
        fetches: Cell::new(0),
    };

    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();
    assert_eq!(backend.fetches.get(), 1);

    let err = view.apply(&selection_for_partner(&memory, 7)).unwrap_err();
    assert!(matches!(err, AgeingError::FilterPersist(_)));

    assert_eq!(backend.fetches.get(), 1);
    assert_eq!(view.summary().partners_label(), "All");
    assert_eq!(view.current().unwrap().report_lines.len(), 2);
}

struct FlakyReads<'a> {
    inner: &'a MemoryBackend,
    remaining_ok: Cell<usize>,
}

impl Backend for FlakyReads<'_> {
    fn create(&self) -> BackendResult<SessionId> {
        self.inner.create()
    }

    fn write(&self, session: SessionId, criteria: &FilterCriteria) -> BackendResult<()> {
        self.inner.write(session, criteria)
    }

    fn view_report(&self, session: SessionId) -> BackendResult<ReportPayload> {
        if self.remaining_ok.get() == 0 {
            return Err(BackendError::Rpc("backend offline".to_string()));
        }
        self.remaining_ok.set(self.remaining_ok.get() - 1);
        self.inner.view_report(session)
    }

    fn get_partners(&self) -> BackendResult<Vec<PartnerChoice>> {
        self.inner.get_partners()
    }

    fn lookup_move(&self, id: MoveId) -> BackendResult<Option<MoveId>> {
        self.inner.lookup_move(id)
    }
}

#[test]
fn failed_fetch_preserves_last_good_render() {
    let memory = sample_backend();
    let backend = FlakyReads {
        inner: &memory,
        remaining_ok: Cell::new(1),
    };

    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();
    assert_eq!(view.current().unwrap().report_lines.len(), 2);

    let err = view.load().unwrap_err();
    assert!(matches!(err, AgeingError::Fetch(_)));
    assert_eq!(view.current().unwrap().report_lines.len(), 2);
    assert!(view.error().unwrap().contains("backend offline"));
}

#[test]
fn expand_is_idempotent() {
    let backend = sample_backend();
    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();

    let first = view.expand(PartnerId(7)).unwrap();
    let table = first.expect("first expansion renders children");
    assert!(table.contains("INV/7"));
    assert!(table.contains("Sales"));
    assert_eq!(view.row_state(PartnerId(7)), RowState::Expanded);

    // Re-activating an expanded row must not render its children twice.
    assert!(view.expand(PartnerId(7)).unwrap().is_none());

    assert!(view.collapse(PartnerId(7)));
    assert_eq!(view.row_state(PartnerId(7)), RowState::Collapsed);
    assert!(view.expand(PartnerId(7)).unwrap().is_some());
}

#[test]
fn expand_unknown_partner_rolls_back() {
    let backend = sample_backend();
    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();

    let err = view.expand(PartnerId(99)).unwrap_err();
    assert!(matches!(err, AgeingError::PartnerLineNotFound(_)));
    assert_eq!(view.row_state(PartnerId(99)), RowState::Collapsed);
}

#[test]
fn toolbar_renders_once() {
    let backend = sample_backend();
    let mut view = ReportView::open(&backend).unwrap();
    view.partner_choices().unwrap();
    view.load().unwrap();

    let first = view.render().unwrap();
    let toolbar = first.toolbar.expect("initial render includes the toolbar");
    assert!(toolbar.contains("Partners:     All"));
    assert!(toolbar.contains("Target move:  Posted"));
    assert!(toolbar.contains("Account type: Receivable"));
    assert!(first.table.contains("$ 150.00"));
    assert!(first.table.contains("TOTAL"));

    let second = view.render().unwrap();
    assert!(second.toolbar.is_none());
    assert!(!second.table.is_empty());
}

#[test]
fn currency_comes_from_latest_response() {
    let backend = MemoryBackend::new(vec![fixture(7, "Acme Industries", 150.0, 30.0, 1)])
        .with_currency(Currency::new("€", SymbolPosition::After, 2));

    let mut view = ReportView::open(&backend).unwrap();
    view.load().unwrap();

    let rendered = view.render().unwrap();
    assert!(rendered.table.contains("150.00 €"));
}

struct NoopPdf;

impl PdfAction for NoopPdf {
    fn run(&self, _request: &PdfRequest, _out: &Path) -> ageing::Result<()> {
        Ok(())
    }
}

struct CaptureSheet {
    last: RefCell<Option<String>>,
}

impl SheetAction for CaptureSheet {
    fn output_format(&self) -> &'static str {
        "xlsx"
    }

    fn run(&self, request: &SheetRequest, _out: &Path) -> ageing::Result<()> {
        *self.last.borrow_mut() = Some(request.report_data.clone());
        Ok(())
    }
}

#[test]
fn exported_lines_survive_serialization() {
    let backend = sample_backend();
    let session = ReportSession::open(&backend).unwrap();

    let capture = CaptureSheet {
        last: RefCell::new(None),
    };
    let dispatcher = ExportDispatcher::new(&NoopPdf, &capture);
    dispatcher
        .export_sheet(&session, Path::new("unused.xlsx"))
        .unwrap();

    let blob = capture.last.borrow().clone().unwrap();
    let decoded: Vec<ReportLine> = serde_json::from_str(&blob).unwrap();
    assert_eq!(decoded, session.fetch().unwrap().report_lines);
}

#[test]
fn csv_sheet_writes_summary_and_detail() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("ageing.csv");

    let backend = sample_backend();
    let session = ReportSession::open(&backend).unwrap();
    let payload = session.fetch().unwrap();

    let request = sheet_request(&payload, CsvSheetAction.output_format()).unwrap();
    CsvSheetAction.run(&request, &out).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("Partner Ageing - Summary"));
    assert!(text.contains("0-30 Duty"));
    assert!(text.contains("Acme Industries"));
    assert!(text.contains("Partner Ageing - Detail"));
    assert!(text.contains("INV/7"));
}
