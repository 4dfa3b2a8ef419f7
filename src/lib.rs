//! Read genealogical node and edge tables from text, normalize node
//! times relative to the youngest generation, build a tree sequence,
//! and render trees as unicode art.
//!
//! The input is two whitespace-delimited text tables with header
//! rows: a node table (`flags`, `time`, `population`) and an edge
//! table (`left`, `right`, `parent`, `child`).  Node ids are row
//! indexes.  See [`parse_nodes`] and [`parse_edges`] for the format
//! details.
//!
//! # Example
//!
//! ```
//! let nodes = "
//! flags time population
//! 0 2.0 0
//! 0 2.0 0
//! 0 5.0 0
//! ";
//! let edges = "
//! left right parent child
//! 0.0 100.0 2 0
//! 0.0 100.0 2 1
//! ";
//! let tables = treedraw::loads(nodes, edges).unwrap();
//! let art = treedraw::render_tables(tables, 5).unwrap();
//! assert!(art.contains('0') && art.contains('1') && art.contains('2'));
//! ```

mod macros;

mod draw;
mod error;
mod position;
mod table_operations;
mod tables;
mod text;
mod time;
mod trees;

pub use draw::draw_unicode;
pub use error::TreeDrawError;
pub use position::Position;
pub use table_operations::{mark_samples, normalize_times};
pub use tables::{
    Edge, EdgeTable, Node, NodeFlags, NodeId, NodeTable, PopulationId, TableCollection,
};
pub use text::{parse_edges, parse_nodes};
pub use time::Time;
pub use trees::{Tree, TreeSequence};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parse node and edge tables from strings.
///
/// # Errors
///
/// [`TreeDrawError::ParseError`] on malformed input.
pub fn loads(nodes: &str, edges: &str) -> Result<TableCollection, TreeDrawError> {
    let nodes = parse_nodes(nodes.as_bytes())?;
    let edges = parse_edges(edges.as_bytes())?;
    Ok(TableCollection::from_tables(nodes, edges))
}

/// Parse node and edge tables from files.
///
/// # Errors
///
/// [`TreeDrawError::IoError`] if either file cannot be opened,
/// [`TreeDrawError::ParseError`] on malformed input.
pub fn load<P: AsRef<Path>>(node_path: P, edge_path: P) -> Result<TableCollection, TreeDrawError> {
    let nodes = parse_nodes(BufReader::new(File::open(node_path)?))?;
    let edges = parse_edges(BufReader::new(File::open(edge_path)?))?;
    Ok(TableCollection::from_tables(nodes, edges))
}

/// Run the whole pipeline on in-memory tables: normalize times,
/// flag the youngest nodes as samples, validate and sort, build the
/// tree sequence, and draw its first tree at the given height.
pub fn render_tables(tables: TableCollection, height: usize) -> Result<String, TreeDrawError> {
    let (tables, samples) = normalize_times(tables)?;
    let mut tables = mark_samples(tables, &samples)?;
    tables.validate()?;
    tables.sort_edges()?;
    let treeseq = TreeSequence::new(tables)?;
    let tree = treeseq.first_tree()?;
    draw_unicode(&tree, height)
}

/// Load tables from files and render the first tree.
///
/// This is the whole program as one call: the returned string is
/// what the `treedraw` binary prints.
///
/// # Errors
///
/// Any error from [`load`] or [`render_tables`]; a missing input
/// file surfaces as [`TreeDrawError::IoError`].
pub fn render_first_tree<P: AsRef<Path>>(
    node_path: P,
    edge_path: P,
    height: usize,
) -> Result<String, TreeDrawError> {
    let tables = load(node_path, edge_path)?;
    render_tables(tables, height)
}
