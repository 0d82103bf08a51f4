use crate::plot::tally::Tally;
use crate::plot::Error;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Return a mnemonic of an instruction log entry, this is the second whitespace separated token.
pub fn mnemonic(entry: &str) -> Option<&str> {
    entry.split_whitespace().nth(1)
}

/// Count mnemonics of an instruction log.
///
/// # Arguments
///
/// * `source`: log name used in error messages
/// * `reader`: log content
pub fn tally_trace(source: &Path, reader: impl BufRead) -> Result<Tally, Error> {
    let mut tally = Tally::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::Read(source.to_path_buf(), e))?;
        let mnemonic = mnemonic(&line).ok_or_else(|| Error::MalformedLine {
            path: source.to_path_buf(),
            line: idx + 1,
            content: line.clone(),
        })?;
        tally.add(mnemonic);
    }
    Ok(tally)
}

/// Count mnemonics of an instruction log file.
pub fn read_trace(path: &Path) -> Result<Tally, Error> {
    let file = File::open(path).map_err(|e| Error::Read(path.to_path_buf(), e))?;
    tally_trace(path, BufReader::new(file))
}
