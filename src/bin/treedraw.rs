//! Render the first tree described by `NodeTable.txt` and
//! `EdgeTable.txt` in the current directory.

const NODE_TABLE: &str = "NodeTable.txt";
const EDGE_TABLE: &str = "EdgeTable.txt";
const DRAWING_HEIGHT: usize = 200;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let drawing = treedraw::render_first_tree(NODE_TABLE, EDGE_TABLE, DRAWING_HEIGHT)?;
    println!("{drawing}");
    Ok(())
}
