//! JSON-lines log source.
//!
//! One [`RawLog`] per line, already in chain order. Blank lines are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};

use scholarship_world::RawLog;

pub fn read_logs(path: &Path) -> Result<Vec<RawLog>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open event log: {}", path.display()))?;
    parse_logs(BufReader::new(file))
        .with_context(|| format!("Failed to read event log: {}", path.display()))
}

/// Parse every line and check the stream never goes back in
/// `(block_number, log_index)` order.
pub fn parse_logs(reader: impl BufRead) -> Result<Vec<RawLog>> {
    let mut logs: Vec<RawLog> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }

        let log: RawLog =
            serde_json::from_str(&line).with_context(|| format!("Malformed log at line {line_no}"))?;

        if let Some(prev) = logs.last() {
            if (log.block_number, log.log_index) <= (prev.block_number, prev.log_index) {
                bail!(
                    "Log at line {line_no} (block {}, index {}) is not after block {}, index {}",
                    log.block_number,
                    log.log_index,
                    prev.block_number,
                    prev.log_index
                );
            }
        }
        logs.push(log);
    }

    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACTORY: &str = "0x00000000000000000000000000000000000000f0";
    const TX: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    fn line(block: u64, index: u32) -> String {
        format!(
            r#"{{"address":"{FACTORY}","block_number":{block},"block_timestamp":1700000000,"transaction_hash":"{TX}","log_index":{index},"event":"OwnershipTransferred","params":{{}}}}"#
        )
    }

    #[test]
    fn parses_lines_and_skips_blanks() {
        let input = format!("{}\n\n{}\n", line(1, 0), line(1, 1));
        let logs = parse_logs(input.as_bytes()).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].log_index, 1);
        assert_eq!(logs[0].event, "OwnershipTransferred");
    }

    #[test]
    fn rejects_out_of_order_logs() {
        let input = format!("{}\n{}\n", line(5, 0), line(4, 3));
        let err = parse_logs(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn rejects_duplicate_position() {
        let input = format!("{}\n{}\n", line(5, 2), line(5, 2));
        assert!(parse_logs(input.as_bytes()).is_err());
    }

    #[test]
    fn reports_malformed_line() {
        let input = format!("{}\nnot json\n", line(1, 0));
        let err = parse_logs(input.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
