use crate::domain::delivery::DeliveryReport;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct ReportRow<'a> {
    op: &'a str,
    lot: &'a str,
    recipient: &'a str,
    placed: u32,
    dropped: u32,
    orphaned: u32,
}

/// Writes one CSV row per delivery.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    /// Creates the writer and emits the header line.
    pub fn new(sink: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        writer.write_record(["op", "lot", "recipient", "placed", "dropped", "orphaned"])?;
        Ok(Self { writer })
    }

    /// `lot` is empty for redelivered orphans, which have no scenario id.
    pub fn write(&mut self, op: &str, lot: &str, report: &DeliveryReport) -> Result<()> {
        self.writer.serialize(ReportRow {
            op,
            lot,
            recipient: &report.recipient,
            placed: report.placed,
            dropped: report.dropped,
            orphaned: report.orphaned,
        })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
