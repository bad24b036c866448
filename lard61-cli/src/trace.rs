//! Raw matrix traces for `simulate`.
//!
//! One sample per line: a timestamp in milliseconds followed by the closed
//! switches as `row,col` pairs. `#` starts a comment.
//!
//! ```text
//! # press 1, then Fn + Esc
//! 0
//! 10 0,1
//! 30 0,0 4,10
//! ```

use anyhow::{bail, Context, Result};
use lard61_matrix::{Col, KeyIndex, KeySet, Row};

/// One raw matrix sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub at_ms: u64,
    pub closed: KeySet,
}

fn parse_key(token: &str) -> Result<KeyIndex> {
    let (row, col) = token
        .split_once(',')
        .with_context(|| format!("expected row,col but got {token:?}"))?;
    let row: usize = row.trim().parse().with_context(|| format!("bad row in {token:?}"))?;
    let col: usize = col.trim().parse().with_context(|| format!("bad column in {token:?}"))?;

    match (Row::new(row), Col::new(col)) {
        (Some(row), Some(col)) => Ok(KeyIndex::new(row, col)),
        (None, _) => bail!("row {row} is outside the matrix"),
        (_, None) => bail!("column {col} is outside the matrix"),
    }
}

fn parse_line(line: &str) -> Result<Option<Sample>> {
    let content = line.split('#').next().unwrap_or("").trim();
    let mut tokens = content.split_whitespace();
    let Some(time) = tokens.next() else {
        return Ok(None);
    };

    let at_ms: u64 = time
        .parse()
        .with_context(|| format!("bad timestamp {time:?}"))?;
    // The pipeline clock counts microseconds
    if at_ms.checked_mul(1000).is_none() {
        bail!("timestamp {at_ms} ms is out of range");
    }
    let closed = tokens.map(parse_key).collect::<Result<KeySet>>()?;

    Ok(Some(Sample { at_ms, closed }))
}

/// Parse a whole trace. Timestamps must not go backwards.
pub fn parse(text: &str) -> Result<Vec<Sample>> {
    let mut samples: Vec<Sample> = Vec::new();

    for (n, line) in text.lines().enumerate() {
        let Some(sample) = parse_line(line).with_context(|| format!("line {}", n + 1))? else {
            continue;
        };
        if let Some(prev) = samples.last() {
            if sample.at_ms < prev.at_ms {
                bail!(
                    "line {}: timestamp {} ms is before the previous sample at {} ms",
                    n + 1,
                    sample.at_ms,
                    prev.at_ms
                );
            }
        }
        samples.push(sample);
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_samples_and_skips_comments() {
        let text = "# header\n\n0\n10 0,1   # the 1 key\n12 4,10 0,0\n";
        let samples = parse(text).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], Sample { at_ms: 0, closed: KeySet::empty() });
        assert_eq!(samples[1].at_ms, 10);
        assert!(samples[1].closed.contains(KeyIndex::at(0, 1)));
        assert_eq!(samples[2].closed.len(), 2);
        assert!(samples[2].closed.contains(KeyIndex::at(4, 10)));
    }

    #[test]
    fn same_timestamp_is_allowed() {
        let samples = parse("5 1,1\n5 1,2\n").unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn rejects_time_going_backwards() {
        let err = parse("10\n9 0,0\n").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn rejects_positions_outside_matrix() {
        let err = parse("0 5,0\n").unwrap_err();
        assert!(format!("{err:#}").contains("row 5"), "{err:#}");

        let err = parse("0 0,14\n").unwrap_err();
        assert!(format!("{err:#}").contains("column 14"), "{err:#}");
    }

    #[test]
    fn rejects_timestamps_past_the_clock() {
        let err = parse("0\n18446744073709552 0,0\n").unwrap_err();
        assert!(format!("{err:#}").contains("out of range"), "{err:#}");
        assert!(parse("18446744073709551 0,0\n").is_ok());
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(parse("x 0,1\n").is_err());
        assert!(parse("0 01\n").is_err());
        assert!(parse("0 a,1\n").is_err());
    }
}
