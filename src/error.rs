use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum LotError {
    #[error("{owner} does not hold {requested} of the lot's item")]
    #[diagnostic(code(lot::insufficient_holdings))]
    InsufficientHoldings { owner: String, requested: u32 },
    #[error("Lot quantity would overflow: {current} + {added}")]
    #[diagnostic(code(lot::quantity_overflow))]
    QuantityOverflow { current: u32, added: u32 },
    #[error("Corrupt item descriptor: {0}")]
    #[diagnostic(
        code(lot::corrupt_descriptor),
        help("the lot cannot be delivered until its item descriptor is repaired")
    )]
    CorruptDescriptor(String),
    #[error("Unknown lot: {0}")]
    UnknownLot(String),
    #[error("Scenario error: {0}")]
    ScenarioError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Orphanage error: {0}")]
    OrphanageError(String),
}

pub type Result<T> = std::result::Result<T, LotError>;
