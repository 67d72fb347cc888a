use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use tracing::debug;

use crate::analyzer::Analyzer;
use crate::analyzer::stats_controller::StatsController;
use crate::config::ParserConfig;
use crate::error::Error;

/// A server log held in memory, one entry per line.
///
/// Bytes that are not valid UTF-8 (old clients put raw high-bit characters
/// in names) are replaced rather than rejected.
#[derive(Debug, Clone, Default)]
pub struct LogFile {
    pub lines: Vec<String>,
}

impl LogFile {
    pub fn from_file(path: &Path) -> Result<LogFile, Error> {
        let file = File::open(path)?;
        let log = Self::from_reader(BufReader::new(file))?;
        debug!("read {} lines from {}", log.lines.len(), path.display());
        Ok(log)
    }

    pub fn from_reader<R: BufRead>(mut reader: R) -> Result<LogFile, Error> {
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            lines.push(line.trim_end_matches(['\n', '\r']).to_owned());
        }
        Ok(LogFile { lines })
    }

    pub fn from_bytes(mut data: impl Read) -> Result<LogFile, Error> {
        let mut contents = Vec::new();
        data.read_to_end(&mut contents)?;
        Self::from_reader(contents.as_slice())
    }

    /// Feed every line to `analyzer` in order, then let it finish.
    pub fn analyze(&self, analyzer: &mut dyn Analyzer) {
        for line in &self.lines {
            analyzer.process(line);
        }
        analyzer.finish();
    }
}

/// Run a whole log through a fresh [`StatsController`].
pub fn parse_log(log: &LogFile, config: ParserConfig) -> StatsController {
    let mut controller = StatsController::new(config);
    log.analyze(&mut controller);
    controller
}
