use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("transcript io: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcript line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
    #[error("transcript encode: {0}")]
    Encode(serde_json::Error),
}

/// One inbound text frame and when it arrived, relative to session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub at_ms: u64,
    pub frame: String,
}

/// Appends entries as JSON lines.
pub struct TranscriptWriter<W: Write> {
    out: W,
    written: usize,
}

impl TranscriptWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        let file = File::create(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "recording transcript");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TranscriptWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn record(&mut self, at: Duration, frame: &str) -> Result<(), TranscriptError> {
        let entry = TranscriptEntry {
            at_ms: at.as_millis() as u64,
            frame: frame.to_owned(),
        };
        let line = serde_json::to_string(&entry).map_err(TranscriptError::Encode)?;
        writeln!(self.out, "{line}")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn flush(&mut self) -> Result<(), TranscriptError> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Read every entry. Blank lines are skipped; a bad line fails the whole read.
pub fn read_transcript(path: impl AsRef<Path>) -> Result<Vec<TranscriptEntry>, TranscriptError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: TranscriptEntry =
            serde_json::from_str(&line).map_err(|source| TranscriptError::Parse {
                line: index + 1,
                source,
            })?;
        entries.push(entry);
    }
    Ok(entries)
}
