use std::io::Write;
use tempfile::NamedTempFile;

/// Writes a scenario file with the standard header followed by `steps`.
pub fn scenario(steps: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "op, lot, name, item, amount").unwrap();
    for step in steps {
        writeln!(file, "{}", step).unwrap();
    }
    file.flush().unwrap();
    file
}
