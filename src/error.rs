use thiserror::Error;

/// Error type for this crate.
///
/// The enum fields correspond to the different parts of a
/// tree sequence handled by this crate: the node and edge
/// tables, the text representation they are parsed from,
/// and the trees built from them.
///
/// # Example
///
/// This input is incorrect because the node table is missing
/// its `time` column:
///
/// ```
/// let nodes = "flags population\n0 0\n";
/// let edges = "left right parent child\n";
/// assert!(matches!(
///     treedraw::loads(nodes, edges),
///     Err(treedraw::TreeDrawError::ParseError { .. })
/// ));
/// ```
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TreeDrawError {
    /// Errors related to node table rows
    #[error("{0:?}")]
    NodeError(String),
    /// Errors related to edge table rows
    #[error("{0:?}")]
    EdgeError(String),
    /// Errors related to whole table collections
    #[error("{0:?}")]
    TableError(String),
    /// Errors related to trees and tree sequences
    #[error("{0:?}")]
    TreeError(String),
    /// Errors raised while parsing text tables
    #[error("parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number in the input
        line: usize,
        /// What went wrong on that line
        message: String,
    },
    /// Errors coming from the platform I/O layer.
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Errors related to low-level types
    #[error("{0:?}")]
    ValueError(String),
}
