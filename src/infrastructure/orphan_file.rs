use crate::domain::lot::Lot;
use crate::error::Result;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

/// Stores pending orphan lots as a JSON array between runs.
pub struct OrphanFile;

impl OrphanFile {
    /// Loads saved lots. A missing file means nothing is pending.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Lot>> {
        let file = match File::open(path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let lots: Vec<Lot> = serde_json::from_reader(BufReader::new(file))?;
        tracing::info!(path = %path.as_ref().display(), count = lots.len(), "Loaded orphan lots");
        Ok(lots)
    }

    /// Replaces the file with `lots`, writing through a temporary sibling file.
    pub fn save<P: AsRef<Path>>(path: P, lots: &[Lot]) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, lots)?;
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), count = lots.len(), "Saved orphan lots");
        Ok(())
    }
}
