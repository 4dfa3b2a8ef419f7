//! Operations that rewrite a [`TableCollection`] into a new one.

use crate::error::TreeDrawError;
use crate::tables::{Node, NodeFlags, NodeId, NodeTable, TableCollection};
use crate::time::Time;

/// Shift all node times so the youngest node is at time zero.
///
/// The minimum of the time column is treated as "the present".
/// The returned collection holds a new node table whose times are
/// `original - minimum`; flags, populations, and the edge table are
/// unchanged.  The second element of the returned tuple is the list
/// of node ids whose original time equals the minimum exactly (no
/// floating point tolerance): the youngest generation, taken to be
/// the samples.
///
/// # Errors
///
/// [`TreeDrawError::TableError`] if the node table is empty, which
/// would leave the minimum undefined.
///
/// # Examples
///
/// ```
/// let nodes = "flags time population\n0 2.0 0\n0 2.0 0\n0 5.0 0\n";
/// let edges = "left right parent child\n0.0 100.0 2 0\n0.0 100.0 2 1\n";
/// let tables = treedraw::loads(nodes, edges).unwrap();
/// let (tables, samples) = treedraw::normalize_times(tables).unwrap();
/// let times: Vec<f64> = tables.nodes().times().map(f64::from).collect();
/// assert_eq!(times, vec![0.0, 0.0, 3.0]);
/// assert_eq!(samples, vec![treedraw::NodeId::from(0), treedraw::NodeId::from(1)]);
/// ```
pub fn normalize_times(
    tables: TableCollection,
) -> Result<(TableCollection, Vec<NodeId>), TreeDrawError> {
    let minimum = tables.nodes().times().min().ok_or_else(|| {
        TreeDrawError::TableError("cannot normalize an empty node table".to_string())
    })?;

    let samples: Vec<NodeId> = tables
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.time == minimum)
        .map(|(i, _)| NodeId::from(i))
        .collect();

    let mut nodes = NodeTable::default();
    for node in tables.nodes().iter() {
        nodes.push(Node {
            flags: node.flags,
            time: Time::try_from(f64::from(node.time) - f64::from(minimum))?,
            population: node.population,
        });
    }
    let edges = tables.edges().clone();

    Ok((TableCollection::from_tables(nodes, edges), samples))
}

/// Return a collection whose listed nodes carry [`NodeFlags::IS_SAMPLE`].
///
/// Other flag bits and all other columns are preserved.
///
/// # Errors
///
/// [`TreeDrawError::NodeError`] if an id is null or out of range.
pub fn mark_samples(
    tables: TableCollection,
    samples: &[NodeId],
) -> Result<TableCollection, TreeDrawError> {
    for sample in samples {
        if tables.nodes().get(*sample).is_none() {
            return Err(TreeDrawError::NodeError(format!(
                "sample id {sample} out of range"
            )));
        }
    }
    let mut nodes = NodeTable::default();
    for (i, node) in tables.nodes().iter().enumerate() {
        let mut flags = node.flags;
        if samples.contains(&NodeId::from(i)) {
            flags |= NodeFlags::IS_SAMPLE;
        }
        nodes.push(Node { flags, ..*node });
    }
    let edges = tables.edges().clone();
    Ok(TableCollection::from_tables(nodes, edges))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables_with_times(times: &[f64]) -> TableCollection {
        let mut tables = TableCollection::new();
        for time in times {
            tables.add_node(NodeFlags::empty(), *time, 0).unwrap();
        }
        tables
    }

    #[test]
    fn minimum_becomes_zero() {
        let (tables, _) = normalize_times(tables_with_times(&[4.0, 7.5, 4.5])).unwrap();
        let minimum = tables.nodes().times().min().unwrap();
        assert_eq!(minimum, 0.0);
    }

    #[test]
    fn worked_example() {
        let (tables, samples) = normalize_times(tables_with_times(&[2.0, 2.0, 5.0])).unwrap();
        let times: Vec<f64> = tables.nodes().times().map(f64::from).collect();
        assert_eq!(times, vec![0.0, 0.0, 3.0]);
        assert_eq!(samples, vec![NodeId::from(0), NodeId::from(1)]);
    }

    #[test]
    fn samples_are_the_argmin_set() {
        let (_, samples) = normalize_times(tables_with_times(&[3.0, 1.0, 2.0, 1.0])).unwrap();
        assert_eq!(samples, vec![NodeId::from(1), NodeId::from(3)]);
    }

    #[test]
    fn counts_are_unchanged() {
        let mut tables = tables_with_times(&[0.0, 1.0, 2.0]);
        tables.add_edge(0.0, 10.0, 1, 0).unwrap();
        tables.add_edge(0.0, 10.0, 2, 1).unwrap();
        let (normalized, _) = normalize_times(tables).unwrap();
        assert_eq!(normalized.num_nodes(), 3);
        assert_eq!(normalized.num_edges(), 2);
    }

    #[test]
    fn negative_input_times_shift_to_zero() {
        let (tables, samples) = normalize_times(tables_with_times(&[-5.0, -2.0])).unwrap();
        let times: Vec<f64> = tables.nodes().times().map(f64::from).collect();
        assert_eq!(times, vec![0.0, 3.0]);
        assert_eq!(samples, vec![NodeId::from(0)]);
    }

    #[test]
    fn empty_node_table_is_an_error() {
        assert!(matches!(
            normalize_times(TableCollection::new()),
            Err(TreeDrawError::TableError(_))
        ));
    }

    #[test]
    fn mark_samples_sets_flags() {
        let tables = tables_with_times(&[1.0, 1.0, 2.0]);
        let samples = vec![NodeId::from(0), NodeId::from(1)];
        let tables = mark_samples(tables, &samples).unwrap();
        assert_eq!(tables.samples(), samples);
    }

    #[test]
    fn mark_samples_rejects_bad_ids() {
        let tables = tables_with_times(&[1.0]);
        assert!(mark_samples(tables, &[NodeId::from(9)]).is_err());
    }
}
