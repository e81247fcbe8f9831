use std::fmt::Write;

use kapi_types::{Node, Response};

/// One line per event: `[action] key = value (index N)`.
pub fn event_line(resp: &Response) -> String {
    match &resp.node {
        Some(node) if node.is_dir() => {
            format!("[{}] {}/ (index {})", resp.action, node.key, node.modified_index)
        }
        Some(node) => format!(
            "[{}] {} = {} (index {})",
            resp.action, node.key, node.value, node.modified_index
        ),
        None => format!("[{}] (index {})", resp.action, resp.index),
    }
}

/// Indented listing of a node and everything under it.
pub fn tree(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.is_dir() {
        let _ = writeln!(out, "{indent}{}/", node.key);
        for child in &node.nodes {
            write_node(out, child, depth + 1);
        }
    } else {
        let _ = writeln!(out, "{indent}{} = {}", node.key, node.value);
    }
}
