//! Decodes the line protocol the external blob tracker writes on its output
//! stream. Two messages exist:
//!
//! ```text
//! BLOB:<id>,<x>,<y>    one tracked centroid, x and y normalized to [0,1]
//! FLUSH                the tracker (re)initialized; drop buffered positions
//! ```
//!
//! Anything else is garbage (common right after the tracker starts up) and
//! is skipped by the reader with a warning.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, u32},
    combinator::map,
    error::Error,
    number::complete::double,
    sequence::{preceded, tuple},
    Finish, IResult,
};

use std::str::FromStr;

/// One decoded centroid report.
#[derive(Debug, Clone, PartialEq)]
pub struct BlobMessage {
    /// Tracker-assigned blob id.
    pub id: u32,
    /// Normalized horizontal position.
    pub x: f64,
    /// Normalized vertical position.
    pub y: f64,
}

/// Any message the tracker can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerMessage {
    /// A centroid report.
    Blob(BlobMessage),
    /// The tracker restarted; buffered positions are stale.
    Flush,
}

fn parse_blob(s: &str) -> IResult<&str, BlobMessage> {
    map(
        tuple((
            preceded(tag("BLOB:"), u32),
            preceded(char(','), double),
            preceded(char(','), double),
        )),
        |(id, x, y)| BlobMessage { id, x, y },
    )(s)
}

fn parse_message(s: &str) -> IResult<&str, TrackerMessage> {
    alt((
        map(parse_blob, TrackerMessage::Blob),
        map(tag("FLUSH"), |_| TrackerMessage::Flush),
    ))(s)
}

impl FromStr for TrackerMessage {
    type Err = Error<String>;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_message(s.trim_end()).finish() {
            Ok((_remaining, msg)) => Ok(msg),
            Err(Error { input, code }) => Err(Error {
                input: input.to_string(),
                code,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_blob_line() {
        let msg = TrackerMessage::from_str("BLOB:7,0.52,0.33\n").unwrap();
        assert_eq!(
            msg,
            TrackerMessage::Blob(BlobMessage {
                id: 7,
                x: 0.52,
                y: 0.33,
            })
        );
    }

    #[test]
    fn decodes_scientific_and_integer_coordinates() {
        let msg = TrackerMessage::from_str("BLOB:0,1,5e-1").unwrap();
        assert_eq!(
            msg,
            TrackerMessage::Blob(BlobMessage {
                id: 0,
                x: 1.0,
                y: 0.5,
            })
        );
    }

    #[test]
    fn decodes_a_flush_line() {
        assert_eq!(
            TrackerMessage::from_str("FLUSH\n").unwrap(),
            TrackerMessage::Flush
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(TrackerMessage::from_str("\u{fffd}\u{fffd}BLOB").is_err());
        assert!(TrackerMessage::from_str("BLOB:x,0.1,0.2").is_err());
        assert!(TrackerMessage::from_str("").is_err());
    }
}
