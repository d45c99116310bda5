use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tabled::{settings::Style, Table, Tabled};
use tracing_subscriber::EnvFilter;

use ageing::backend::{Backend, HttpBackend, MOVE_MODEL};
use ageing::config::{self, Config, CONFIG_TEMPLATE};
use ageing::error::{AgeingError, Result};
use ageing::export::{CsvSheetAction, ExportDispatcher, TypstPdfAction};
use ageing::filter::{AccountType, Choice, FilterSelection, PostingState};
use ageing::nav::{open_target, NavigationBridge, WebViewer};
use ageing::report::{CategoryId, MoveId, PartnerChoice, PartnerId};
use ageing::view::ReportView;

#[derive(Parser)]
#[command(name = "ageing")]
#[command(version, about = "CLI client for partner ageing statement of account reports", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.ageing or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Default)]
struct FilterArgs {
    /// Report ageing as of this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    as_of: Option<String>,

    /// Partner to include, by id or name (can be repeated)
    #[arg(short, long, value_name = "ID_OR_NAME")]
    partner: Vec<String>,

    /// Partner category to include, by id or name (can be repeated)
    #[arg(long, value_name = "ID_OR_NAME")]
    category: Vec<String>,

    /// Posting state filter: draft, posted, or all (default: posted)
    #[arg(long, value_name = "STATE")]
    state: Option<String>,

    /// Account type: customer (receivable) or supplier (payable)
    #[arg(long, value_name = "TYPE")]
    account_type: Option<String>,
}

impl FilterArgs {
    fn is_empty(&self) -> bool {
        self.as_of.is_none()
            && self.partner.is_empty()
            && self.category.is_empty()
            && self.state.is_none()
            && self.account_type.is_none()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template file
    Init,

    /// Fetch and display the ageing report
    Show {
        #[command(flatten)]
        filters: FilterArgs,

        /// Expand a partner's journal items under its row (can be repeated)
        #[arg(long, value_name = "ID_OR_NAME")]
        expand: Vec<String>,
    },

    /// List the partners available to the partner filter
    Partners,

    /// Export the report to a PDF document
    ExportPdf {
        #[command(flatten)]
        filters: FilterArgs,

        /// Custom output file path (default: output_dir/AGEING-<date>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open the generated PDF with the system default viewer
        #[arg(long)]
        open: bool,
    },

    /// Export the report to a spreadsheet document
    ExportSheet {
        #[command(flatten)]
        filters: FilterArgs,

        /// Custom output file path (default: output_dir/AGEING-<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Open the detail view for a journal entry
    OpenEntry {
        /// Journal entry id as shown in the drill-down rows
        entry: i64,

        /// Print the record URL instead of opening it
        #[arg(long)]
        url_only: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config::config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Show { filters, expand } => cmd_show(&cfg_dir, &filters, &expand),
        Commands::Partners => cmd_partners(&cfg_dir),
        Commands::ExportPdf {
            filters,
            output,
            open,
        } => cmd_export_pdf(&cfg_dir, &filters, output, open),
        Commands::ExportSheet { filters, output } => cmd_export_sheet(&cfg_dir, &filters, output),
        Commands::OpenEntry { entry, url_only } => cmd_open_entry(&cfg_dir, entry, url_only),
    }
}

/// Initialize config directory with a template file
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(AgeingError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;

    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized ageing config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point the client at your backend:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!();
    println!("Then fetch your first report:");
    println!("  ageing show");

    Ok(())
}

// Table row struct for tabled
#[derive(Tabled)]
struct PartnerRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "NAME")]
    name: String,
}

fn load_checked(cfg_dir: &Path) -> Result<Config> {
    if !cfg_dir.exists() {
        return Err(AgeingError::ConfigNotFound(cfg_dir.to_path_buf()));
    }
    config::load_config(cfg_dir)
}

/// Fetch and display the ageing report
fn cmd_show(cfg_dir: &Path, filters: &FilterArgs, expand: &[String]) -> Result<()> {
    let config = load_checked(cfg_dir)?;
    validate_filter_args(filters)?;

    let backend = HttpBackend::new(&config.backend);
    let mut view = ReportView::open(&backend)?;
    let partners = view.partner_choices()?.to_vec();
    view.load()?;

    if !filters.is_empty() {
        let categories = view
            .current()
            .map(|payload| payload.filters.category_list.clone())
            .unwrap_or_default();
        let selection = build_selection(filters, &partners, &categories)?;
        view.apply(&selection)?;
    }

    let Some(rendered) = view.render() else {
        return Ok(());
    };
    if let Some(toolbar) = rendered.toolbar {
        println!("{toolbar}");
        println!();
    }
    println!("{}", rendered.table);
    println!();
    println!(
        "Total: {} partners",
        view.current().map_or(0, |payload| payload.report_lines.len())
    );

    for reference in expand {
        let (partner, label) = resolve_partner(reference, &partners)?;
        match view.expand(partner)? {
            Some(table) => {
                println!();
                println!("{label}");
                println!("{table}");
            }
            None => println!("{label} is already expanded"),
        }
    }

    Ok(())
}

/// List the partners available to the partner filter
fn cmd_partners(cfg_dir: &Path) -> Result<()> {
    let config = load_checked(cfg_dir)?;

    let backend = HttpBackend::new(&config.backend);
    let partners = backend.get_partners().map_err(AgeingError::Fetch)?;

    if partners.is_empty() {
        println!("No partners available.");
        return Ok(());
    }

    let rows: Vec<PartnerRow> = partners
        .iter()
        .map(|choice| PartnerRow {
            id: choice.id.0,
            name: choice.text.clone(),
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Open a session and apply any requested filters ahead of an export.
fn prepare_export_view<'a>(
    filters: &FilterArgs,
    backend: &'a HttpBackend,
) -> Result<ReportView<'a>> {
    let mut view = ReportView::open(backend)?;
    if !filters.is_empty() {
        let partners = view.partner_choices()?.to_vec();
        view.load()?;
        let categories = view
            .current()
            .map(|payload| payload.filters.category_list.clone())
            .unwrap_or_default();
        view.apply(&build_selection(filters, &partners, &categories)?)?;
    }
    Ok(view)
}

fn export_path(cfg_dir: &Path, config: &Config, extension: &str) -> Result<PathBuf> {
    let output_dir = config::resolve_output_dir(&config.export.output_dir, cfg_dir);
    std::fs::create_dir_all(&output_dir)?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(output_dir.join(format!("AGEING-{today}.{extension}")))
}

/// Export the report to a PDF document
fn cmd_export_pdf(
    cfg_dir: &Path,
    filters: &FilterArgs,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let config = load_checked(cfg_dir)?;
    validate_filter_args(filters)?;

    let backend = HttpBackend::new(&config.backend);
    let view = prepare_export_view(filters, &backend)?;

    let pdf_path = match output {
        Some(path) => path,
        None => export_path(cfg_dir, &config, "pdf")?,
    };

    let dispatcher = ExportDispatcher::new(&TypstPdfAction, &CsvSheetAction);
    dispatcher.export_pdf(view.session(), &pdf_path)?;

    println!("Generated ageing report PDF");
    println!("  Saved: {}", pdf_path.display());

    if open {
        open_target(&pdf_path.display().to_string())?;
    }

    Ok(())
}

/// Export the report to a spreadsheet document
fn cmd_export_sheet(cfg_dir: &Path, filters: &FilterArgs, output: Option<PathBuf>) -> Result<()> {
    let config = load_checked(cfg_dir)?;
    validate_filter_args(filters)?;

    let backend = HttpBackend::new(&config.backend);
    let view = prepare_export_view(filters, &backend)?;

    let sheet_path = match output {
        Some(path) => path,
        None => export_path(cfg_dir, &config, "csv")?,
    };

    let dispatcher = ExportDispatcher::new(&TypstPdfAction, &CsvSheetAction);
    dispatcher.export_sheet(view.session(), &sheet_path)?;

    println!("Generated ageing report spreadsheet");
    println!("  Saved: {}", sheet_path.display());

    Ok(())
}

/// Open the detail view for a journal entry
fn cmd_open_entry(cfg_dir: &Path, entry: i64, url_only: bool) -> Result<()> {
    let config = load_checked(cfg_dir)?;
    let viewer = WebViewer::new(&config.backend.url);

    if url_only {
        // Raw-id fallback without a backend round-trip
        println!("{}", viewer.record_url(MOVE_MODEL, MoveId(entry)));
        return Ok(());
    }

    let backend = HttpBackend::new(&config.backend);
    let bridge = NavigationBridge::new(&backend, &viewer);
    let id = bridge.open_journal_entry(MoveId(entry))?;
    println!("Opened journal entry {id}");

    Ok(())
}

fn validate_filter_args(args: &FilterArgs) -> Result<()> {
    parse_date_arg(args.as_of.as_deref())?;
    PostingState::from_control(args.state.as_deref().unwrap_or(""))?;
    AccountType::from_control(args.account_type.as_deref().unwrap_or(""))?;
    Ok(())
}

fn parse_date_arg(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AgeingError::InvalidDate(s.to_string())),
        None => Ok(None),
    }
}

/// Resolve a partner reference (numeric id or name) against the picker.
/// Numeric references are accepted as backend-native ids even when the
/// picker does not list them.
fn resolve_partner(reference: &str, partners: &[PartnerChoice]) -> Result<(PartnerId, String)> {
    if let Ok(raw) = reference.parse::<i64>() {
        let id = PartnerId(raw);
        let label = partners
            .iter()
            .find(|choice| choice.id == id)
            .map_or_else(|| reference.to_string(), |choice| choice.text.clone());
        return Ok((id, label));
    }
    partners
        .iter()
        .find(|choice| choice.text.eq_ignore_ascii_case(reference))
        .map(|choice| (choice.id, choice.text.clone()))
        .ok_or_else(|| AgeingError::UnknownPartner(reference.to_string()))
}

fn resolve_category(
    reference: &str,
    categories: &[(CategoryId, String)],
) -> Result<(CategoryId, String)> {
    if let Ok(raw) = reference.parse::<i64>() {
        let id = CategoryId(raw);
        let label = categories
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map_or_else(|| reference.to_string(), |(_, name)| name.clone());
        return Ok((id, label));
    }
    categories
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(reference))
        .map(|(id, name)| (*id, name.clone()))
        .ok_or_else(|| AgeingError::UnknownCategory(reference.to_string()))
}

/// Build the filter selection from CLI arguments: the full picker option
/// lists with the requested entries flagged as selected.
fn build_selection(
    args: &FilterArgs,
    partners: &[PartnerChoice],
    categories: &[(CategoryId, String)],
) -> Result<FilterSelection> {
    let mut selection = FilterSelection {
        date_from: parse_date_arg(args.as_of.as_deref())?,
        partners: partners
            .iter()
            .map(|choice| Choice {
                id: choice.id,
                label: choice.text.clone(),
                selected: false,
            })
            .collect(),
        categories: categories
            .iter()
            .map(|(id, name)| Choice {
                id: *id,
                label: name.clone(),
                selected: false,
            })
            .collect(),
        target_move: args.state.clone().unwrap_or_default(),
        result_selection: args.account_type.clone().unwrap_or_default(),
    };

    for reference in &args.partner {
        let (id, label) = resolve_partner(reference, partners)?;
        select_choice(&mut selection.partners, id, &label);
    }
    for reference in &args.category {
        let (id, label) = resolve_category(reference, categories)?;
        select_choice(&mut selection.categories, id, &label);
    }

    Ok(selection)
}

fn select_choice<Id: Copy + PartialEq>(choices: &mut Vec<Choice<Id>>, id: Id, label: &str) {
    if let Some(choice) = choices.iter_mut().find(|choice| choice.id == id) {
        choice.selected = true;
    } else {
        choices.push(Choice {
            id,
            label: label.to_string(),
            selected: true,
        });
    }
}
