use clap::Parser;
use escrow_lot::application::distributor::Distributor;
use escrow_lot::application::orphanage::{self, Orphanage, OrphanageHandle};
use escrow_lot::domain::delivery::Location;
use escrow_lot::domain::item::ItemType;
use escrow_lot::domain::lot::Lot;
use escrow_lot::error::{LotError, Result as LotResult};
use escrow_lot::infrastructure::in_memory::{
    DEFAULT_SLOTS, InMemoryHoldings, InMemoryRecipients, InMemoryWorld, LogNotifier,
};
use escrow_lot::infrastructure::orphan_file::OrphanFile;
use escrow_lot::interfaces::csv::report_writer::ReportWriter;
use escrow_lot::interfaces::csv::scenario_reader::{ScenarioReader, ScenarioStep, StepOp};
use escrow_lot::logging::init_logging;
use miette::{IntoDiagnostic, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input scenario CSV file
    input: PathBuf,

    /// JSON file of orphan lots, loaded at start and rewritten at exit.
    #[arg(long)]
    orphans: Option<PathBuf>,

    /// Retry every pending orphan lot on this interval, in seconds.
    #[arg(long)]
    sweep_secs: Option<u64>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    log_json: bool,
}

struct Scenario<'a> {
    holdings: InMemoryHoldings,
    recipients: InMemoryRecipients,
    distributor: Arc<Distributor>,
    orphanage: &'a OrphanageHandle,
    lots: HashMap<String, Lot>,
}

impl Scenario<'_> {
    async fn apply<W: Write>(
        &mut self,
        step: &ScenarioStep,
        out: &mut ReportWriter<W>,
    ) -> LotResult<()> {
        match step.op {
            StepOp::Stack => self.recipients.set_stack_size(step.item()?, step.amount()?),
            StepOp::Join => {
                let name = step.name()?;
                let slots = step.amount.map_or(DEFAULT_SLOTS, |slots| slots as usize);
                self.recipients
                    .join(name, slots, Location::new("world", 0.0, 64.0, 0.0));
                for report in self.orphanage.recipient_available(name).await? {
                    out.write("redeliver", "", &report)?;
                }
            }
            StepOp::Leave => self.recipients.leave(step.name()?),
            StepOp::Grant => {
                self.holdings
                    .grant(step.name()?, &ItemType::new(step.item()?), step.amount()?)
            }
            StepOp::Start => {
                let id = step.lot()?;
                if self.lots.contains_key(id) {
                    return Err(LotError::ScenarioError(format!("lot {id} already exists")));
                }
                let mut lot = Lot::new(&ItemType::new(step.item()?), step.name()?)?;
                lot.add_items(step.amount()?, Some(&self.holdings))?;
                self.lots.insert(id.to_string(), lot);
            }
            StepOp::Win | StepOp::Cancel => {
                let id = step.lot()?;
                let lot = self
                    .lots
                    .get_mut(id)
                    .ok_or_else(|| LotError::UnknownLot(id.to_string()))?;
                let (op, report) = if step.op == StepOp::Win {
                    ("win", self.distributor.win_lot(lot, step.name()?)?)
                } else {
                    ("cancel", self.distributor.cancel_lot(lot)?)
                };
                out.write(op, id, &report)?;
                if lot.is_empty() {
                    self.lots.remove(id);
                }
            }
        }
        Ok(())
    }

    /// Cancels every lot still in escrow, in lot id order.
    ///
    /// Owners that are offline get their items through the orphanage.
    fn return_unfinished<W: Write>(&mut self, out: &mut ReportWriter<W>) -> LotResult<()> {
        let mut ids: Vec<String> = self.lots.keys().cloned().collect();
        ids.sort();
        for id in ids {
            let Some(mut lot) = self.lots.remove(&id) else {
                continue;
            };
            tracing::info!(lot = %id, owner = lot.owner(), "Returning unfinished lot");
            match self.distributor.cancel_lot(&mut lot) {
                Ok(report) => out.write("cancel", &id, &report)?,
                Err(e) => eprintln!("Error returning lot {}: {}", id, e),
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let recipients = InMemoryRecipients::new();
    let (queue, inbox) = orphanage::channel();
    let distributor = Arc::new(Distributor::new(
        Box::new(recipients.clone()),
        Box::new(InMemoryWorld::new()),
        Box::new(queue),
        Box::new(LogNotifier),
    ));

    let saved = match &cli.orphans {
        Some(path) => OrphanFile::load(path)?,
        None => Vec::new(),
    };
    let orphanage = Orphanage::new(distributor.clone(), inbox)
        .with_pending(saved)
        .spawn(cli.sweep_secs.map(Duration::from_secs));

    let file = File::open(&cli.input).into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock())?;
    let mut scenario = Scenario {
        holdings: InMemoryHoldings::new(),
        recipients,
        distributor,
        orphanage: &orphanage,
        lots: HashMap::new(),
    };

    for step in ScenarioReader::new(file).steps() {
        match step {
            Ok(step) => {
                if let Err(e) = scenario.apply(&step, &mut writer).await {
                    eprintln!("Error applying {:?} step: {}", step.op, e);
                }
            }
            Err(e) => {
                eprintln!("Error reading scenario step: {}", e);
            }
        }
    }
    scenario.return_unfinished(&mut writer)?;
    writer.flush()?;
    drop(scenario);

    let pending = orphanage.shutdown().await?;
    match cli.orphans {
        Some(path) => OrphanFile::save(path, &pending)?,
        None if !pending.is_empty() => {
            tracing::warn!(
                count = pending.len(),
                "Orphan lots discarded, pass --orphans to keep them"
            );
        }
        None => {}
    }

    Ok(())
}
