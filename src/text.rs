//! Parsing of the whitespace-delimited text table format.
//!
//! Both tables start with a header row naming their columns.
//! Node tables must provide `flags`, `time`, and `population`;
//! edge tables must provide `left`, `right`, `parent`, and `child`.
//! Columns may appear in any order and extra columns are ignored.
//! Blank lines are skipped.  The first malformed row aborts the
//! parse with an error naming its line number.

use std::io::BufRead;
use std::str::FromStr;

use crate::error::TreeDrawError;
use crate::tables::{Edge, EdgeTable, Node, NodeFlags, NodeTable, PopulationId};
use crate::position::Position;
use crate::time::Time;

const NODE_COLUMNS: [&str; 3] = ["flags", "time", "population"];
const EDGE_COLUMNS: [&str; 4] = ["left", "right", "parent", "child"];

struct Header {
    // Input column index per required column, in the order
    // the required-column list was given.
    columns: Vec<usize>,
}

// Row text split into fields, tagged with its input line number.
struct Row<'a> {
    fields: Vec<&'a str>,
    line: usize,
}

impl Header {
    fn parse(text: &str, line: usize, required: &[&str]) -> Result<Self, TreeDrawError> {
        let names: Vec<&str> = text.split_whitespace().collect();
        let mut columns = Vec::with_capacity(required.len());
        for name in required {
            match names.iter().position(|n| n == name) {
                Some(index) => columns.push(index),
                None => {
                    return Err(TreeDrawError::ParseError {
                        line,
                        message: format!("missing required column {name:?}"),
                    })
                }
            }
        }
        Ok(Self { columns })
    }
}

impl<'a> Row<'a> {
    fn field<T>(&self, header: &Header, required_index: usize, name: &str) -> Result<T, TreeDrawError>
    where
        T: FromStr,
    {
        let column = header.columns[required_index];
        let raw = self.fields.get(column).ok_or_else(|| TreeDrawError::ParseError {
            line: self.line,
            message: format!("too few fields for column {name:?}"),
        })?;
        raw.parse().map_err(|_| TreeDrawError::ParseError {
            line: self.line,
            message: format!("invalid value for {name:?}: {raw:?}"),
        })
    }
}

// Pulls the header row, then feeds each non-blank data row to `f`.
fn parse_table<R, F>(reader: R, required: &[&str], mut f: F) -> Result<(), TreeDrawError>
where
    R: BufRead,
    F: FnMut(&Header, &Row) -> Result<(), TreeDrawError>,
{
    let mut header: Option<Header> = None;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        match &header {
            None => header = Some(Header::parse(&line, lineno, required)?),
            Some(header) => {
                let row = Row {
                    fields: line.split_whitespace().collect(),
                    line: lineno,
                };
                f(header, &row)?;
            }
        }
    }
    match header {
        Some(_) => Ok(()),
        None => Err(TreeDrawError::ParseError {
            line: 1,
            message: "empty input: no header row".to_string(),
        }),
    }
}

/// Parse a node table from text.
///
/// # Errors
///
/// [`TreeDrawError::ParseError`] on a missing column or malformed row,
/// [`TreeDrawError::IoError`] if the reader fails.
///
/// # Examples
///
/// ```
/// let text = "flags time population\n1 0.0 0\n0 3.0 0\n";
/// let nodes = treedraw::parse_nodes(text.as_bytes()).unwrap();
/// assert_eq!(nodes.len(), 2);
/// ```
pub fn parse_nodes<R: BufRead>(reader: R) -> Result<NodeTable, TreeDrawError> {
    let mut table = NodeTable::default();
    parse_table(reader, &NODE_COLUMNS, |header, row| {
        let flags: u32 = row.field(header, 0, "flags")?;
        let time: f64 = row.field(header, 1, "time")?;
        let population: i32 = row.field(header, 2, "population")?;
        let time = Time::try_from(time).map_err(|_| TreeDrawError::ParseError {
            line: row.line,
            message: format!("invalid value for \"time\": {time:?}"),
        })?;
        table.push(Node {
            flags: NodeFlags::from_bits_retain(flags),
            time,
            population: PopulationId::from(population),
        });
        Ok(())
    })?;
    Ok(table)
}

/// Parse an edge table from text.
///
/// # Errors
///
/// [`TreeDrawError::ParseError`] on a missing column or malformed row,
/// [`TreeDrawError::IoError`] if the reader fails.
///
/// # Examples
///
/// ```
/// let text = "left right parent child\n0.0 100.0 2 0\n0.0 100.0 2 1\n";
/// let edges = treedraw::parse_edges(text.as_bytes()).unwrap();
/// assert_eq!(edges.len(), 2);
/// ```
pub fn parse_edges<R: BufRead>(reader: R) -> Result<EdgeTable, TreeDrawError> {
    let mut table = EdgeTable::default();
    parse_table(reader, &EDGE_COLUMNS, |header, row| {
        let left: f64 = row.field(header, 0, "left")?;
        let right: f64 = row.field(header, 1, "right")?;
        let parent: i32 = row.field(header, 2, "parent")?;
        let child: i32 = row.field(header, 3, "child")?;
        let interval = |value: f64, name: &str| {
            Position::try_from(value).map_err(|_| TreeDrawError::ParseError {
                line: row.line,
                message: format!("invalid value for {name:?}: {value:?}"),
            })
        };
        table.push(Edge {
            left: interval(left, "left")?,
            right: interval(right, "right")?,
            parent: parent.into(),
            child: child.into(),
        });
        Ok(())
    })?;
    Ok(table)
}
