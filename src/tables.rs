use bitflags::bitflags;

use crate::error::TreeDrawError;
use crate::position::Position;
use crate::time::Time;

/// The id of a [`Node`]: its row index in the node table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(i32);

impl_id_traits!(NodeId);

/// The id of the population a [`Node`] belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct PopulationId(i32);

impl_id_traits!(PopulationId);

bitflags! {
    /// Per-node bit flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct NodeFlags: u32 {
        /// The node is a sampled individual.
        const IS_SAMPLE = 1 << 0;
    }
}

/// A genealogical individual: flags, birth time, population label.
///
/// Nodes have no explicit id field.  A node's id is its row
/// index in the [`NodeTable`] that holds it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    /// Bit flags, including sample status
    pub flags: NodeFlags,
    /// Birth time
    pub time: Time,
    /// Population label
    pub population: PopulationId,
}

impl Node {
    /// `true` if [`NodeFlags::IS_SAMPLE`] is set.
    pub fn is_sample(&self) -> bool {
        self.flags.contains(NodeFlags::IS_SAMPLE)
    }
}

/// A parent-child relationship valid over the genomic
/// interval `[left, right)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Left end of the interval (inclusive)
    pub left: Position,
    /// Right end of the interval (exclusive)
    pub right: Position,
    /// Id of the parent node
    pub parent: NodeId,
    /// Id of the child node
    pub child: NodeId,
}

/// An ordered collection of [`Node`] rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTable {
    rows: Vec<Node>,
}

impl NodeTable {
    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row access by id.
    pub fn get(&self, node: NodeId) -> Option<&Node> {
        if node.is_null() {
            None
        } else {
            self.rows.get(node.index())
        }
    }

    /// Iterate over rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> + '_ {
        self.rows.iter()
    }

    /// The time column, in id order.
    pub fn times(&self) -> impl Iterator<Item = Time> + '_ {
        self.rows.iter().map(|node| node.time)
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        self.rows.push(node);
        NodeId::from(self.rows.len() - 1)
    }
}

/// An ordered collection of [`Edge`] rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeTable {
    rows: Vec<Edge>,
}

impl EdgeTable {
    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over rows in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.rows.iter()
    }

    pub(crate) fn as_slice(&self) -> &[Edge] {
        &self.rows
    }

    pub(crate) fn push(&mut self, edge: Edge) {
        self.rows.push(edge);
    }

    pub(crate) fn sort_by_key_order(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.rows.len());
        self.rows = order.iter().map(|&i| self.rows[i]).collect();
    }
}

/// The node and edge tables describing a sequence of trees.
///
/// # Examples
///
/// ```
/// let mut tables = treedraw::TableCollection::new();
/// let child = tables.add_node(treedraw::NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
/// let parent = tables.add_node(treedraw::NodeFlags::empty(), 1.0, 0).unwrap();
/// tables.add_edge(0.0, 100.0, parent, child).unwrap();
/// tables.validate().unwrap();
/// assert_eq!(tables.num_nodes(), 2);
/// assert_eq!(tables.num_edges(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableCollection {
    nodes: NodeTable,
    edges: EdgeTable,
}

impl TableCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a collection from already-parsed tables.
    pub fn from_tables(nodes: NodeTable, edges: EdgeTable) -> Self {
        Self { nodes, edges }
    }

    /// The node table.
    pub fn nodes(&self) -> &NodeTable {
        &self.nodes
    }

    /// The edge table.
    pub fn edges(&self) -> &EdgeTable {
        &self.edges
    }

    /// The number of node rows.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The number of edge rows.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Append a node row, returning its id.
    ///
    /// # Errors
    ///
    /// [`TreeDrawError::ValueError`] if `time` is not finite.
    pub fn add_node<P: Into<PopulationId>>(
        &mut self,
        flags: NodeFlags,
        time: f64,
        population: P,
    ) -> Result<NodeId, TreeDrawError> {
        let time = Time::try_from(time)?;
        Ok(self.nodes.push(Node {
            flags,
            time,
            population: population.into(),
        }))
    }

    /// Append an edge row.
    ///
    /// # Errors
    ///
    /// [`TreeDrawError::ValueError`] if either coordinate is invalid,
    /// [`TreeDrawError::EdgeError`] if `left >= right`.
    pub fn add_edge<N: Into<NodeId>>(
        &mut self,
        left: f64,
        right: f64,
        parent: N,
        child: N,
    ) -> Result<(), TreeDrawError> {
        let left = Position::try_from(left)?;
        let right = Position::try_from(right)?;
        if left >= right {
            return Err(TreeDrawError::EdgeError(format!(
                "left ({left}) must be < right ({right})"
            )));
        }
        self.edges.push(Edge {
            left,
            right,
            parent: parent.into(),
            child: child.into(),
        });
        Ok(())
    }

    /// The node ids whose rows have [`NodeFlags::IS_SAMPLE`] set.
    pub fn samples(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_sample())
            .map(|(i, _)| NodeId::from(i))
            .collect()
    }

    /// The right-most edge coordinate, taken as the genome length.
    pub fn sequence_length(&self) -> Position {
        self.edges
            .iter()
            .map(|edge| edge.right)
            .max()
            .unwrap_or_else(Position::zero)
    }

    /// Check the referential invariants of the collection.
    ///
    /// Every edge must name in-range parent and child ids,
    /// the parent must differ from the child and be strictly
    /// older, and the interval must have positive length.
    ///
    /// # Errors
    ///
    /// [`TreeDrawError::EdgeError`] naming the first offending row.
    pub fn validate(&self) -> Result<(), TreeDrawError> {
        for (i, edge) in self.edges.iter().enumerate() {
            let parent = self.nodes.get(edge.parent).ok_or_else(|| {
                TreeDrawError::EdgeError(format!(
                    "edge {i}: parent id {} out of range",
                    edge.parent
                ))
            })?;
            let child = self.nodes.get(edge.child).ok_or_else(|| {
                TreeDrawError::EdgeError(format!("edge {i}: child id {} out of range", edge.child))
            })?;
            if edge.parent == edge.child {
                return Err(TreeDrawError::EdgeError(format!(
                    "edge {i}: parent equals child ({})",
                    edge.parent
                )));
            }
            if parent.time <= child.time {
                return Err(TreeDrawError::EdgeError(format!(
                    "edge {i}: parent {} (time {}) not older than child {} (time {})",
                    edge.parent, parent.time, edge.child, child.time
                )));
            }
            if edge.left >= edge.right {
                return Err(TreeDrawError::EdgeError(format!(
                    "edge {i}: left ({}) must be < right ({})",
                    edge.left, edge.right
                )));
            }
        }
        Ok(())
    }

    /// Sort the edge table into the canonical order:
    /// parent birth time, then parent id, child id, and left coordinate.
    ///
    /// # Errors
    ///
    /// [`TreeDrawError::EdgeError`] if an edge names an out-of-range parent.
    pub fn sort_edges(&mut self) -> Result<(), TreeDrawError> {
        let mut order: Vec<usize> = (0..self.edges.len()).collect();
        let edges = self.edges.as_slice();
        let mut parent_times = Vec::with_capacity(edges.len());
        for edge in edges {
            match self.nodes.get(edge.parent) {
                Some(node) => parent_times.push(node.time),
                None => {
                    return Err(TreeDrawError::EdgeError(format!(
                        "cannot sort: parent id {} out of range",
                        edge.parent
                    )))
                }
            }
        }
        order.sort_by(|&a, &b| {
            let (ea, eb) = (&edges[a], &edges[b]);
            parent_times[a]
                .cmp(&parent_times[b])
                .then_with(|| ea.parent.cmp(&eb.parent))
                .then_with(|| ea.child.cmp(&eb.child))
                .then_with(|| ea.left.cmp(&eb.left))
        });
        self.edges.sort_by_key_order(&order);
        Ok(())
    }
}
