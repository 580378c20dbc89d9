use crate::error::{LotError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum StepOp {
    /// Sets the stack size of `item` to `amount`.
    Stack,
    /// `name` comes online with `amount` empty slots.
    Join,
    Leave,
    /// Gives `name` `amount` of `item` outside any lot.
    Grant,
    /// `name` puts `amount` of `item` up as lot `lot`.
    Start,
    /// Lot `lot` goes to `name`.
    Win,
    /// Lot `lot` goes back to its owner.
    Cancel,
}

/// One line of a scenario file: `op, lot, name, item, amount`.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct ScenarioStep {
    pub op: StepOp,
    pub lot: Option<String>,
    pub name: Option<String>,
    pub item: Option<String>,
    pub amount: Option<u32>,
}

impl ScenarioStep {
    pub fn lot(&self) -> Result<&str> {
        self.lot.as_deref().ok_or_else(|| self.missing("lot"))
    }

    pub fn name(&self) -> Result<&str> {
        self.name.as_deref().ok_or_else(|| self.missing("name"))
    }

    pub fn item(&self) -> Result<&str> {
        self.item.as_deref().ok_or_else(|| self.missing("item"))
    }

    pub fn amount(&self) -> Result<u32> {
        self.amount.ok_or_else(|| self.missing("amount"))
    }

    fn missing(&self, field: &str) -> LotError {
        LotError::ScenarioError(format!("{:?} step is missing `{}`", self.op, field))
    }
}

/// Reads scenario steps from a CSV source.
pub struct ScenarioReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ScenarioReader<R> {
    /// Wraps a CSV source with a header row.
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes steps; a malformed line yields an error and the
    /// following lines are still read.
    pub fn steps(self) -> impl Iterator<Item = Result<ScenarioStep>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LotError::from))
    }
}
