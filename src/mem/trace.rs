//! the request trace loader.
//!
//! a trace is a plain text file with one request per line:
//!
//! ```text
//! cycle op channel rank bank subarray row col
//! ```
//!
//! lines starting with `#` and blank lines are skipped. entries must be
//! sorted by cycle, the driver replays them with backpressure.

use std::path::Path;

use eyre::{eyre, Context, Result};
use itertools::Itertools;
use tracing::info;

use super::request::{MemAddr, OpKind};

/// one parsed trace line
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// earliest cycle the request may enter the controller
    pub cycle: u64,
    pub op: OpKind,
    pub addr: MemAddr,
}

#[derive(Debug, Default)]
pub struct Trace {
    pub entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read trace {:?}", path))?;
        let mut entries = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry = parse_line(line)
                .wrap_err_with(|| format!("{}:{}: bad trace line", path.display(), number + 1))?;
            if entries.last().is_some_and(|last: &TraceEntry| entry.cycle < last.cycle) {
                return Err(eyre!(
                    "{}:{}: trace cycles must be non decreasing",
                    path.display(),
                    number + 1
                ));
            }
            entries.push(entry);
        }
        info!(entries = entries.len(), ?path, "trace loaded");
        Ok(Self { entries })
    }
}

fn parse_line(line: &str) -> Result<TraceEntry> {
    let (cycle, op, channel, rank, bank, subarray, row, col) = line
        .split_whitespace()
        .collect_tuple()
        .ok_or_else(|| eyre!("expected 8 fields, got {}", line.split_whitespace().count()))?;
    Ok(TraceEntry {
        cycle: cycle.parse()?,
        op: op.parse()?,
        addr: MemAddr {
            channel: channel.parse()?,
            rank: rank.parse()?,
            bank: bank.parse()?,
            subarray: subarray.parse()?,
            row: row.parse()?,
            col: col.parse()?,
        },
    })
}
