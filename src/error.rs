use std::path::PathBuf;
use thiserror::Error;

use crate::backend::BackendError;
use crate::report::PartnerId;

#[derive(Error, Debug)]
pub enum AgeingError {
    #[error("Config directory not found at {0}. Run 'ageing init' to create it.")]
    ConfigNotFound(PathBuf),

    #[error("Config file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config directory already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Could not create a report session: {0}")]
    SessionCreate(#[source] BackendError),

    #[error("Could not load the report: {0}")]
    Fetch(#[source] BackendError),

    #[error("Could not save the filter criteria: {0}")]
    FilterPersist(#[source] BackendError),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Typst not found. Install it from https://typst.app/ or run: cargo install typst-cli")]
    TypstNotFound,

    #[error("Partner {0} has no line in the current report")]
    PartnerLineNotFound(PartnerId),

    #[error("Unknown partner '{0}'. Use 'ageing partners' to list available partners.")]
    UnknownPartner(String),

    #[error("Unknown partner category '{0}'.")]
    UnknownCategory(String),

    #[error("Invalid posting state '{0}'. Use 'draft', 'posted', or 'all'.")]
    InvalidPostingState(String),

    #[error("Invalid account type '{0}'. Use 'customer' or 'supplier'.")]
    InvalidAccountType(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgeingError>;
