//! Splits a raw log line into its `MM:SS` clock and message body.

use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{char, digit1, multispace0},
    combinator::{map_res, rest},
    sequence::{preceded, separated_pair, terminated, tuple},
};

use crate::types::Timestamp;

pub type IResult<I, O> = nom::IResult<I, O, nom::error::Error<I>>;

/// A line that carried a server clock. `message` has trailing whitespace
/// removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub timestamp: Timestamp,
    pub message: &'a str,
}

fn minutes(i: &str) -> IResult<&str, u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(i)
}

fn seconds(i: &str) -> IResult<&str, u64> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u64>()
    })(i)
}

fn clock(i: &str) -> IResult<&str, Timestamp> {
    let (i, (m, s)) = preceded(multispace0, separated_pair(minutes, char(':'), seconds))(i)?;
    Ok((i, Timestamp::from_minutes_seconds(m, s)))
}

fn log_line(i: &str) -> IResult<&str, LogLine<'_>> {
    let (i, (timestamp, message)) = tuple((terminated(clock, char(' ')), rest))(i)?;
    Ok((
        i,
        LogLine {
            timestamp,
            message: message.trim_end(),
        },
    ))
}

/// Returns `None` for anything that is not shaped like `MM:SS <message>`.
pub fn parse_line(line: &str) -> Option<LogLine<'_>> {
    log_line(line).ok().map(|(_, parsed)| parsed)
}
