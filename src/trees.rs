use streaming_iterator::StreamingIterator;

use crate::error::TreeDrawError;
use crate::position::Position;
use crate::tables::{NodeId, TableCollection};
use crate::time::Time;

/// Parent, child, and sibling links for one node in one [`Tree`].
///
/// Fields equal to [`NodeId::NULL`] indicate the absence of the
/// relationship: a root has no parent, a leaf no children.
#[derive(Copy, Clone)]
struct TopologyData {
    parent: NodeId,
    left_child: NodeId,
    right_child: NodeId,
    left_sib: NodeId,
    right_sib: NodeId,
}

impl Default for TopologyData {
    fn default() -> Self {
        Self {
            parent: NodeId::NULL,
            left_child: NodeId::NULL,
            right_child: NodeId::NULL,
            left_sib: NodeId::NULL,
            right_sib: NodeId::NULL,
        }
    }
}

/// A sequence of correlated genealogical trees along a genome.
///
/// Built once from a validated [`TableCollection`], then queried
/// through [`TreeSequence::tree_iterator`] or
/// [`TreeSequence::first_tree`].
pub struct TreeSequence {
    tables: TableCollection,
    samples: Vec<NodeId>,
    is_sample: Vec<bool>,
    // Edge table indexes in insertion order (by left coordinate,
    // then parent time ascending) and removal order (by right
    // coordinate, then parent time descending).
    edge_input_order: Vec<usize>,
    edge_output_order: Vec<usize>,
    sequence_length: Position,
    num_trees: u32,
}

impl TreeSequence {
    /// Create a tree sequence, taking the sample list from
    /// [`NodeFlags::IS_SAMPLE`](crate::NodeFlags::IS_SAMPLE).
    ///
    /// The tables are consumed and owned by the tree sequence.
    ///
    /// # Errors
    ///
    /// [`TreeDrawError::TreeError`] if no node is flagged as a sample
    /// or the edge table is empty.
    /// [`TreeDrawError::EdgeError`] if the tables fail validation.
    pub fn new(tables: TableCollection) -> Result<Self, TreeDrawError> {
        let samples = tables.samples();
        Self::new_with_samples(tables, &samples)
    }

    /// Create a tree sequence from an explicit sample list,
    /// ignoring node flags.
    ///
    /// # Errors
    ///
    /// [`TreeDrawError::TreeError`] if the sample list is empty,
    /// holds duplicates, or names an out-of-range node, or if the
    /// edge table is empty.
    /// [`TreeDrawError::EdgeError`] if the tables fail validation.
    pub fn new_with_samples(
        tables: TableCollection,
        samples: &[NodeId],
    ) -> Result<Self, TreeDrawError> {
        tables.validate()?;
        if samples.is_empty() {
            return Err(TreeDrawError::TreeError("no samples".to_string()));
        }
        if tables.num_edges() == 0 {
            return Err(TreeDrawError::TreeError(
                "cannot build a tree sequence from an empty edge table".to_string(),
            ));
        }
        let mut is_sample = vec![false; tables.num_nodes()];
        for sample in samples {
            if tables.nodes().get(*sample).is_none() {
                return Err(TreeDrawError::TreeError(format!(
                    "invalid sample id {sample}"
                )));
            }
            if is_sample[sample.index()] {
                return Err(TreeDrawError::TreeError(format!(
                    "duplicate sample id {sample}"
                )));
            }
            is_sample[sample.index()] = true;
        }

        let (edge_input_order, edge_output_order) = edge_orders(&tables);
        let sequence_length = tables.sequence_length();
        let num_trees = count_trees(&tables, sequence_length);
        Ok(Self {
            tables,
            samples: samples.to_vec(),
            is_sample,
            edge_input_order,
            edge_output_order,
            sequence_length,
            num_trees,
        })
    }

    /// The tables the tree sequence was built from.
    pub fn tables(&self) -> &TableCollection {
        &self.tables
    }

    /// The sample node ids.
    pub fn sample_nodes(&self) -> &[NodeId] {
        &self.samples
    }

    /// The number of trees along the genome.
    pub fn num_trees(&self) -> u32 {
        self.num_trees
    }

    /// The right-most coordinate covered by any edge.
    pub fn sequence_length(&self) -> Position {
        self.sequence_length
    }

    /// A streaming iterator over all trees, left to right.
    ///
    /// ```
    /// use streaming_iterator::StreamingIterator;
    /// # let nodes = "flags time population\n1 0.0 0\n1 0.0 0\n0 1.0 0\n";
    /// # let edges = "left right parent child\n0.0 50.0 2 0\n0.0 50.0 2 1\n";
    /// # let tables = treedraw::loads(nodes, edges).unwrap();
    /// let treeseq = treedraw::TreeSequence::new(tables).unwrap();
    /// let mut iterator = treeseq.tree_iterator();
    /// while let Some(tree) = iterator.next() {
    ///     assert!(tree.num_nodes() > 0);
    /// }
    /// ```
    pub fn tree_iterator(&self) -> Tree<'_> {
        Tree::new(self)
    }

    /// The first tree in the sequence: the genealogy of the
    /// left-most genomic interval.
    ///
    /// # Errors
    ///
    /// [`TreeDrawError::TreeError`] if the sequence holds no trees.
    pub fn first_tree(&self) -> Result<Tree<'_>, TreeDrawError> {
        let mut tree = self.tree_iterator();
        tree.advance();
        if tree.get().is_some() {
            Ok(tree)
        } else {
            Err(TreeDrawError::TreeError(
                "tree sequence holds no trees".to_string(),
            ))
        }
    }
}

fn edge_orders(tables: &TableCollection) -> (Vec<usize>, Vec<usize>) {
    let edges: Vec<_> = tables.edges().iter().copied().collect();
    let time = |node: NodeId| -> Time {
        // Tables are validated before this runs.
        match tables.nodes().get(node) {
            Some(row) => row.time,
            None => unreachable!("unvalidated edge table"),
        }
    };
    let mut input: Vec<usize> = (0..edges.len()).collect();
    input.sort_by(|&a, &b| {
        edges[a]
            .left
            .cmp(&edges[b].left)
            .then_with(|| time(edges[a].parent).cmp(&time(edges[b].parent)))
            .then_with(|| edges[a].parent.cmp(&edges[b].parent))
            .then_with(|| edges[a].child.cmp(&edges[b].child))
    });
    let mut output: Vec<usize> = (0..edges.len()).collect();
    output.sort_by(|&a, &b| {
        edges[a]
            .right
            .cmp(&edges[b].right)
            .then_with(|| time(edges[b].parent).cmp(&time(edges[a].parent)))
            .then_with(|| edges[b].parent.cmp(&edges[a].parent))
            .then_with(|| edges[b].child.cmp(&edges[a].child))
    });
    (input, output)
}

fn count_trees(tables: &TableCollection, sequence_length: Position) -> u32 {
    let mut breakpoints = std::collections::BTreeSet::new();
    for edge in tables.edges().iter() {
        breakpoints.insert(edge.left);
        breakpoints.insert(edge.right);
    }
    let interior = breakpoints
        .iter()
        .filter(|p| **p > Position::zero() && **p < sequence_length)
        .count() as u32;
    interior + 1
}

/// The genealogy of one non-recombining genomic interval.
///
/// A `Tree` is also the streaming iterator over the trees of its
/// [`TreeSequence`]: calling
/// [`advance`](streaming_iterator::StreamingIterator::advance)
/// moves it to the next interval.
pub struct Tree<'treeseq> {
    topology: Vec<TopologyData>,
    left: Position,
    right: Position,
    treeseq: &'treeseq TreeSequence,
    input_edge_index: usize,
    output_edge_index: usize,
    x: Position,
    advanced: bool,
}

impl<'treeseq> Tree<'treeseq> {
    fn new(treeseq: &'treeseq TreeSequence) -> Self {
        Self {
            topology: vec![TopologyData::default(); treeseq.tables.num_nodes()],
            left: Position::zero(),
            right: Position::zero(),
            treeseq,
            input_edge_index: 0,
            output_edge_index: 0,
            x: Position::zero(),
            advanced: false,
        }
    }

    fn id_in_range(&self, u: NodeId) -> Result<usize, TreeDrawError> {
        if u.is_null() || u.index() >= self.topology.len() {
            Err(TreeDrawError::TreeError(format!(
                "node id {u} out of range"
            )))
        } else {
            Ok(u.index())
        }
    }

    /// The number of nodes in the underlying tables.
    pub fn num_nodes(&self) -> usize {
        self.topology.len()
    }

    /// The `[left, right)` interval this tree covers.
    pub fn interval(&self) -> (Position, Position) {
        (self.left, self.right)
    }

    /// The birth time of node `u`.
    pub fn time<N: Into<NodeId>>(&self, u: N) -> Result<Time, TreeDrawError> {
        let index = self.id_in_range(u.into())?;
        match self.treeseq.tables.nodes().get(NodeId::from(index)) {
            Some(node) => Ok(node.time),
            None => unreachable!("topology and node table lengths match"),
        }
    }

    /// The parent of node `u`, or [`NodeId::NULL`] for a root.
    pub fn parent<N: Into<NodeId>>(&self, u: N) -> Result<NodeId, TreeDrawError> {
        Ok(self.topology[self.id_in_range(u.into())?].parent)
    }

    /// The left-most child of node `u`, or [`NodeId::NULL`] for a leaf.
    pub fn left_child<N: Into<NodeId>>(&self, u: N) -> Result<NodeId, TreeDrawError> {
        Ok(self.topology[self.id_in_range(u.into())?].left_child)
    }

    /// The sibling to the right of node `u`, or [`NodeId::NULL`].
    pub fn right_sib<N: Into<NodeId>>(&self, u: N) -> Result<NodeId, TreeDrawError> {
        Ok(self.topology[self.id_in_range(u.into())?].right_sib)
    }

    /// Iterate over the children of node `u`, left to right.
    pub fn children<N: Into<NodeId>>(
        &self,
        u: N,
    ) -> Result<impl Iterator<Item = NodeId> + '_, TreeDrawError> {
        let index = self.id_in_range(u.into())?;
        Ok(ChildIterator {
            next_child: self.topology[index].left_child,
            tree: self,
        })
    }

    /// Iterate over the roots of the tree, left to right.
    ///
    /// A root is a parentless node that either has children or is
    /// itself a sample; parentless, childless non-samples are
    /// padding rows, not roots.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.topology
            .iter()
            .enumerate()
            .filter(|(i, row)| {
                row.parent.is_null()
                    && (!row.left_child.is_null() || self.treeseq.is_sample[*i])
            })
            .map(|(i, _)| NodeId::from(i))
    }

    /// All roots, collected.
    pub fn roots_to_vec(&self) -> Vec<NodeId> {
        self.roots().collect()
    }

    /// Preorder traversal over every root's subtree, left to right.
    pub fn traverse_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut stack = self.roots_to_vec();
        stack.reverse();
        PreorderNodeIterator { stack, tree: self }
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let lsib = self.topology[child.index()].left_sib;
        let rsib = self.topology[child.index()].right_sib;
        if lsib.is_null() {
            self.topology[parent.index()].left_child = rsib;
        } else {
            self.topology[lsib.index()].right_sib = rsib;
        }
        if rsib.is_null() {
            self.topology[parent.index()].right_child = lsib;
        } else {
            self.topology[rsib.index()].left_sib = lsib;
        }
        let child_row = &mut self.topology[child.index()];
        child_row.parent = NodeId::NULL;
        child_row.left_sib = NodeId::NULL;
        child_row.right_sib = NodeId::NULL;
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        let rchild = self.topology[parent.index()].right_child;
        if rchild.is_null() {
            self.topology[parent.index()].left_child = child;
            self.topology[child.index()].left_sib = NodeId::NULL;
        } else {
            self.topology[rchild.index()].right_sib = child;
            self.topology[child.index()].left_sib = rchild;
        }
        self.topology[child.index()].right_sib = NodeId::NULL;
        self.topology[child.index()].parent = parent;
        self.topology[parent.index()].right_child = child;
    }
}

struct ChildIterator<'a, 'treeseq> {
    next_child: NodeId,
    tree: &'a Tree<'treeseq>,
}

impl Iterator for ChildIterator<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.next_child.is_null() {
            None
        } else {
            let child = self.next_child;
            self.next_child = self.tree.topology[child.index()].right_sib;
            Some(child)
        }
    }
}

struct PreorderNodeIterator<'a, 'treeseq> {
    stack: Vec<NodeId>,
    tree: &'a Tree<'treeseq>,
}

impl Iterator for PreorderNodeIterator<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        // Push right-to-left so children come off the stack in order.
        let mut child = self.tree.topology[node.index()].right_child;
        while !child.is_null() {
            self.stack.push(child);
            child = self.tree.topology[child.index()].left_sib;
        }
        Some(node)
    }
}

/// Left-to-right iteration of trees.
impl<'treeseq> StreamingIterator for Tree<'treeseq> {
    type Item = Tree<'treeseq>;

    fn advance(&mut self) {
        let edges = self.treeseq.tables.edges().as_slice();
        let input = self.treeseq.edge_input_order.as_slice();
        let output = self.treeseq.edge_output_order.as_slice();
        if self.input_edge_index < input.len() || self.x < self.treeseq.sequence_length {
            for edge_index in output[self.output_edge_index..].iter() {
                let edge = edges[*edge_index];
                if edge.right != self.x {
                    break;
                }
                self.detach(edge.parent, edge.child);
                self.output_edge_index += 1;
            }
            for edge_index in input[self.input_edge_index..].iter() {
                let edge = edges[*edge_index];
                if edge.left != self.x {
                    break;
                }
                self.attach(edge.parent, edge.child);
                self.input_edge_index += 1;
            }
            let mut right = self.treeseq.sequence_length;
            if self.input_edge_index < input.len() {
                right = std::cmp::min(right, edges[input[self.input_edge_index]].left);
            }
            if self.output_edge_index < output.len() {
                right = std::cmp::min(right, edges[output[self.output_edge_index]].right);
            }
            self.left = self.x;
            self.right = right;
            self.x = right;
            self.advanced = true;
        } else {
            self.advanced = false;
        }
    }

    fn get(&self) -> Option<&Self::Item> {
        match self.advanced {
            true => Some(self),
            false => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::NodeFlags;

    fn one_tree_tables() -> TableCollection {
        // 2 is the root, 0 and 1 its children.
        let mut tables = TableCollection::new();
        let c0 = tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        let c1 = tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        let p = tables.add_node(NodeFlags::empty(), 1.0, 0).unwrap();
        tables.add_edge(0.0, 100.0, p, c0).unwrap();
        tables.add_edge(0.0, 100.0, p, c1).unwrap();
        tables
    }

    fn two_tree_tables() -> TableCollection {
        // [0, 50): root 3 over {0, 1}, with 2 hanging off 4.
        // [50, 100): root 4 over {2, 3}, 3 over {0, 1}.
        let mut tables = TableCollection::new();
        for _ in 0..3 {
            tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        }
        tables.add_node(NodeFlags::empty(), 1.0, 0).unwrap();
        tables.add_node(NodeFlags::empty(), 2.0, 0).unwrap();
        tables.add_edge(0.0, 100.0, 3, 0).unwrap();
        tables.add_edge(0.0, 100.0, 3, 1).unwrap();
        tables.add_edge(0.0, 100.0, 4, 2).unwrap();
        tables.add_edge(50.0, 100.0, 4, 3).unwrap();
        tables
    }

    #[test]
    fn single_tree_topology() {
        let treeseq = TreeSequence::new(one_tree_tables()).unwrap();
        assert_eq!(treeseq.num_trees(), 1);
        let tree = treeseq.first_tree().unwrap();
        assert_eq!(tree.parent(0).unwrap(), 2);
        assert_eq!(tree.parent(1).unwrap(), 2);
        assert!(tree.parent(2).unwrap().is_null());
        let children: Vec<NodeId> = tree.children(2).unwrap().collect();
        assert_eq!(children, vec![NodeId::from(0), NodeId::from(1)]);
        assert_eq!(tree.roots_to_vec(), vec![NodeId::from(2)]);
        assert_eq!(tree.interval(), (Position::zero(), tree.right));
        assert_eq!(f64::from(tree.right), 100.0);
    }

    #[test]
    fn preorder_visits_parents_first() {
        let treeseq = TreeSequence::new(one_tree_tables()).unwrap();
        let tree = treeseq.first_tree().unwrap();
        let order: Vec<NodeId> = tree.traverse_nodes().collect();
        assert_eq!(
            order,
            vec![NodeId::from(2), NodeId::from(0), NodeId::from(1)]
        );
    }

    #[test]
    fn two_trees_are_iterated() {
        let treeseq = TreeSequence::new(two_tree_tables()).unwrap();
        assert_eq!(treeseq.num_trees(), 2);

        let mut iterator = treeseq.tree_iterator();
        let mut intervals = vec![];
        let mut root_counts = vec![];
        while let Some(tree) = iterator.next() {
            let (left, right) = tree.interval();
            intervals.push((f64::from(left), f64::from(right)));
            root_counts.push(tree.roots_to_vec().len());
        }
        assert_eq!(intervals, vec![(0.0, 50.0), (50.0, 100.0)]);
        // First tree: 3 and 4 are both roots; second: only 4.
        assert_eq!(root_counts, vec![2, 1]);
    }

    #[test]
    fn second_tree_reparents() {
        let treeseq = TreeSequence::new(two_tree_tables()).unwrap();
        let mut iterator = treeseq.tree_iterator();
        iterator.advance();
        assert!(iterator.get().unwrap().parent(3).unwrap().is_null());
        iterator.advance();
        let tree = iterator.get().unwrap();
        assert_eq!(tree.parent(3).unwrap(), 4);
        assert_eq!(tree.parent(2).unwrap(), 4);
    }

    #[test]
    fn sample_list_from_flags() {
        let treeseq = TreeSequence::new(one_tree_tables()).unwrap();
        assert_eq!(treeseq.sample_nodes(), &[NodeId::from(0), NodeId::from(1)]);
    }

    #[test]
    fn explicit_sample_list_is_checked() {
        let tables = one_tree_tables();
        assert!(matches!(
            TreeSequence::new_with_samples(tables.clone(), &[]),
            Err(TreeDrawError::TreeError(_))
        ));
        assert!(TreeSequence::new_with_samples(
            tables.clone(),
            &[NodeId::from(0), NodeId::from(0)]
        )
        .is_err());
        assert!(TreeSequence::new_with_samples(tables, &[NodeId::from(9)]).is_err());
    }

    #[test]
    fn no_samples_is_an_error() {
        let mut tables = TableCollection::new();
        tables.add_node(NodeFlags::empty(), 0.0, 0).unwrap();
        tables.add_node(NodeFlags::empty(), 1.0, 0).unwrap();
        tables.add_edge(0.0, 10.0, 1, 0).unwrap();
        assert!(matches!(
            TreeSequence::new(tables),
            Err(TreeDrawError::TreeError(_))
        ));
    }

    #[test]
    fn empty_edge_table_is_an_error() {
        let mut tables = TableCollection::new();
        tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        assert!(TreeSequence::new(tables).is_err());
    }

    #[test]
    fn isolated_sample_is_a_root() {
        let mut tables = one_tree_tables();
        // Node 3 is a sample connected to nothing.
        tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        let treeseq = TreeSequence::new(tables).unwrap();
        let tree = treeseq.first_tree().unwrap();
        assert_eq!(
            tree.roots_to_vec(),
            vec![NodeId::from(2), NodeId::from(3)]
        );
    }
}
