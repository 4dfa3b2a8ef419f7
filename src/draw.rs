//! Fixed-height unicode rendering of one [`Tree`].
//!
//! Node labels are node ids.  Leaves sit on the bottom row, ordered
//! left to right; internal nodes are centered over their children,
//! with vertical placement proportional to birth time.  Connectors
//! use the box-drawing set `━ ┃ ┏ ┓ ┗ ┛ ┳ ┻ ┣ ┫ ╋`.

use crate::error::TreeDrawError;
use crate::tables::NodeId;
use crate::trees::Tree;

// Connector connectivity bits for one canvas cell.
const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

fn connector_char(mask: u8) -> char {
    match mask {
        m if m == (LEFT | RIGHT) => '━',
        m if m == (UP | DOWN) => '┃',
        m if m == (DOWN | RIGHT) => '┏',
        m if m == (DOWN | LEFT) => '┓',
        m if m == (UP | RIGHT) => '┗',
        m if m == (UP | LEFT) => '┛',
        m if m == (LEFT | RIGHT | DOWN) => '┳',
        m if m == (LEFT | RIGHT | UP) => '┻',
        m if m == (UP | DOWN | RIGHT) => '┣',
        m if m == (UP | DOWN | LEFT) => '┫',
        m if m == (UP | DOWN | LEFT | RIGHT) => '╋',
        m if m == LEFT || m == RIGHT => '━',
        m if m == UP || m == DOWN => '┃',
        _ => ' ',
    }
}

struct Layout {
    // Per node: column of the label center and canvas row, where set.
    column: Vec<Option<usize>>,
    row: Vec<Option<usize>>,
    drawn: Vec<NodeId>,
    width: usize,
}

impl Layout {
    fn column_of(&self, u: NodeId) -> usize {
        // Only called for nodes placed during assignment.
        self.column[u.index()].unwrap_or(0)
    }

    fn row_of(&self, u: NodeId) -> usize {
        self.row[u.index()].unwrap_or(0)
    }
}

fn assign_columns(
    tree: &Tree<'_>,
    u: NodeId,
    depth: usize,
    slot: usize,
    next_leaf: &mut usize,
    max_depth: &mut usize,
    layout: &mut Layout,
) -> Result<usize, TreeDrawError> {
    *max_depth = (*max_depth).max(depth);
    let children: Vec<NodeId> = tree.children(u)?.collect();
    let column = if children.is_empty() {
        let column = *next_leaf * slot + slot / 2;
        *next_leaf += 1;
        column
    } else {
        let mut first = 0;
        let mut last = 0;
        for (i, child) in children.iter().enumerate() {
            let c = assign_columns(tree, *child, depth + 1, slot, next_leaf, max_depth, layout)?;
            if i == 0 {
                first = c;
            }
            last = c;
        }
        (first + last) / 2
    };
    layout.column[u.index()] = Some(column);
    layout.drawn.push(u);
    Ok(column)
}

fn assign_rows(tree: &Tree<'_>, height: usize, layout: &mut Layout) -> Result<(), TreeDrawError> {
    let mut min_time = f64::INFINITY;
    let mut max_time = f64::NEG_INFINITY;
    for u in &layout.drawn {
        let t = f64::from(tree.time(*u)?);
        min_time = min_time.min(t);
        max_time = max_time.max(t);
    }
    let span = max_time - min_time;

    // Parents precede children in preorder, so the parent row is
    // final by the time each child is placed.
    for u in tree.traverse_nodes() {
        let t = f64::from(tree.time(u)?);
        let scaled = if span > 0.0 {
            ((max_time - t) / span * ((height - 1) as f64)).round() as usize
        } else {
            height - 1
        };
        let mut row = scaled;
        let parent = tree.parent(u)?;
        if !parent.is_null() {
            row = row.max(layout.row_of(parent) + 2);
        }
        if row > height - 1 {
            return Err(TreeDrawError::ValueError(format!(
                "height {height} too small to separate node {u} from its parent"
            )));
        }
        layout.row[u.index()] = Some(row);
    }
    Ok(())
}

/// Render the tree as unicode art of exactly `height` rows.
///
/// # Errors
///
/// [`TreeDrawError::ValueError`] if `height` is below 3 or too small
/// to separate every parent from its children.
/// [`TreeDrawError::TreeError`] if the tree has no roots.
///
/// # Examples
///
/// ```
/// let nodes = "flags time population\n1 0.0 0\n1 0.0 0\n0 1.0 0\n";
/// let edges = "left right parent child\n0.0 100.0 2 0\n0.0 100.0 2 1\n";
/// let tables = treedraw::loads(nodes, edges).unwrap();
/// let treeseq = treedraw::TreeSequence::new(tables).unwrap();
/// let tree = treeseq.first_tree().unwrap();
/// let art = treedraw::draw_unicode(&tree, 5).unwrap();
/// assert!(art.contains('0') && art.contains('1') && art.contains('2'));
/// ```
pub fn draw_unicode(tree: &Tree<'_>, height: usize) -> Result<String, TreeDrawError> {
    if height < 3 {
        return Err(TreeDrawError::ValueError(format!(
            "drawing height must be at least 3, got {height}"
        )));
    }
    let roots = tree.roots_to_vec();
    if roots.is_empty() {
        return Err(TreeDrawError::TreeError(
            "tree has no roots to draw".to_string(),
        ));
    }

    let num_nodes = tree.num_nodes();
    let widest_label = tree
        .traverse_nodes()
        .map(|u| u.to_string().len())
        .max()
        .unwrap_or(1);
    let slot = widest_label + 1;

    let mut layout = Layout {
        column: vec![None; num_nodes],
        row: vec![None; num_nodes],
        drawn: Vec::new(),
        width: 0,
    };
    let mut next_leaf = 0;
    let mut max_depth = 0;
    for root in &roots {
        assign_columns(tree, *root, 0, slot, &mut next_leaf, &mut max_depth, &mut layout)?;
    }
    if height < 2 * max_depth + 1 {
        return Err(TreeDrawError::ValueError(format!(
            "height {height} too small for a tree of depth {max_depth}"
        )));
    }
    assign_rows(tree, height, &mut layout)?;

    layout.width = next_leaf * slot + widest_label;
    let mut canvas = vec![vec![' '; layout.width]; height];
    let mut connectors: Vec<std::collections::HashMap<usize, u8>> = vec![Default::default(); height];

    for u in &layout.drawn {
        let column = layout.column_of(*u);
        let row = layout.row_of(*u);
        // Connectors below the label.
        let children: Vec<NodeId> = tree.children(*u)?.collect();
        if !children.is_empty() {
            let bar_row = row + 1;
            let child_columns: Vec<usize> =
                children.iter().map(|c| layout.column_of(*c)).collect();
            let lo = child_columns
                .iter()
                .copied()
                .min()
                .unwrap_or(column)
                .min(column);
            let hi = child_columns
                .iter()
                .copied()
                .max()
                .unwrap_or(column)
                .max(column);
            for x in lo..=hi {
                let mut mask = 0;
                if x > lo {
                    mask |= LEFT;
                }
                if x < hi {
                    mask |= RIGHT;
                }
                *connectors[bar_row].entry(x).or_insert(0) |= mask;
            }
            for c in &child_columns {
                *connectors[bar_row].entry(*c).or_insert(0) |= DOWN;
            }
            *connectors[bar_row].entry(column).or_insert(0) |= UP;
            for child in &children {
                let child_column = layout.column_of(*child);
                let child_row = layout.row_of(*child);
                for r in (bar_row + 1)..child_row {
                    *connectors[r].entry(child_column).or_insert(0) |= UP | DOWN;
                }
            }
        }
    }

    for (row, cells) in connectors.iter().enumerate() {
        for (column, mask) in cells {
            canvas[row][*column] = connector_char(*mask);
        }
    }
    // Labels overwrite connectors.
    for u in &layout.drawn {
        let label = u.to_string();
        let column = layout.column_of(*u);
        let row = layout.row_of(*u);
        let start = column.saturating_sub(label.len() / 2);
        for (i, ch) in label.chars().enumerate() {
            if start + i < layout.width {
                canvas[row][start + i] = ch;
            }
        }
    }

    let mut out = String::new();
    for row in canvas {
        let line: String = row.into_iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{NodeFlags, TableCollection};
    use crate::trees::TreeSequence;

    fn cherry() -> TableCollection {
        let mut tables = TableCollection::new();
        let c0 = tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        let c1 = tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        let p = tables.add_node(NodeFlags::empty(), 1.0, 0).unwrap();
        tables.add_edge(0.0, 100.0, p, c0).unwrap();
        tables.add_edge(0.0, 100.0, p, c1).unwrap();
        tables
    }

    #[test]
    fn cherry_drawing_has_all_labels_and_connectors() {
        let treeseq = TreeSequence::new(cherry()).unwrap();
        let tree = treeseq.first_tree().unwrap();
        let art = draw_unicode(&tree, 5).unwrap();
        for label in ["0", "1", "2"] {
            assert!(art.contains(label), "missing {label} in:\n{art}");
        }
        assert!(art.contains('┏'));
        assert!(art.contains('┓'));
        assert!(art.contains('┻'));
        assert_eq!(art.lines().count(), 5);
    }

    #[test]
    fn root_is_above_its_children() {
        let treeseq = TreeSequence::new(cherry()).unwrap();
        let tree = treeseq.first_tree().unwrap();
        let art = draw_unicode(&tree, 7).unwrap();
        let lines: Vec<&str> = art.lines().collect();
        let row_of = |label: &str| lines.iter().position(|l| l.contains(label)).unwrap();
        assert!(row_of("2") < row_of("0"));
    }

    #[test]
    fn deep_chain_respects_time_scaling() {
        // 0 at time 0, 1 at time 1, 2 at time 10: the long branch
        // should place node 1 far below node 2.
        let mut tables = TableCollection::new();
        tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        tables.add_node(NodeFlags::empty(), 1.0, 0).unwrap();
        tables.add_node(NodeFlags::empty(), 10.0, 0).unwrap();
        tables.add_edge(0.0, 10.0, 1, 0).unwrap();
        tables.add_edge(0.0, 10.0, 2, 1).unwrap();
        let treeseq = TreeSequence::new(tables).unwrap();
        let tree = treeseq.first_tree().unwrap();
        let art = draw_unicode(&tree, 21).unwrap();
        let lines: Vec<&str> = art.lines().collect();
        let row_of = |label: &str| lines.iter().position(|l| l.contains(label)).unwrap();
        assert_eq!(row_of("2"), 0);
        assert!(row_of("1") >= 17);
    }

    #[test]
    fn height_too_small_is_an_error() {
        let treeseq = TreeSequence::new(cherry()).unwrap();
        let tree = treeseq.first_tree().unwrap();
        assert!(matches!(
            draw_unicode(&tree, 2),
            Err(TreeDrawError::ValueError(_))
        ));
    }

    #[test]
    fn forest_renders_every_root() {
        let mut tables = cherry();
        let c2 = tables.add_node(NodeFlags::IS_SAMPLE, 0.0, 0).unwrap();
        let p2 = tables.add_node(NodeFlags::empty(), 1.0, 0).unwrap();
        tables.add_edge(0.0, 100.0, p2, c2).unwrap();
        let treeseq = TreeSequence::new(tables).unwrap();
        let tree = treeseq.first_tree().unwrap();
        assert_eq!(tree.roots_to_vec().len(), 2);
        let art = draw_unicode(&tree, 9).unwrap();
        for label in ["0", "1", "2", "3", "4"] {
            assert!(art.contains(label), "missing {label} in:\n{art}");
        }
    }
}
