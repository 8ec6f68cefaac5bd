//! Renders a `{nodes, edges}` reachability or path result into the
//! deterministic Markdown block an AI agent reads (spec §4.14): a
//! `## Graph` section of maximal simple chains, followed by a `## Nodes`
//! section with a snippet window per node.

use std::collections::{HashMap, HashSet};

use crate::storage::{Edge, Node};

/// Node count at or below which windows get the wide size; above it,
/// windows narrow so the whole block stays readable.
const WIDE_WINDOW_NODE_COUNT: usize = 5;
const WIDE_WINDOW_LINES: u32 = 6;
const NARROW_WINDOW_LINES: u32 = 2;

pub struct FormatInput<'a> {
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
    /// Node id to omit from the `## Nodes` section (the traversal's start,
    /// or one anchor of a `pathsBetween` result).
    pub start: Option<&'a str>,
}

/// `read_file(relative_path)` supplies file contents for the snippet
/// window; returning `None` (file unreadable, or removed since indexing)
/// renders the node's header without a snippet.
pub fn format_markdown(input: &FormatInput, read_file: impl Fn(&str) -> Option<String>) -> String {
    let by_id: HashMap<&str, &Node> = input.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let window_lines = if input.nodes.len() <= WIDE_WINDOW_NODE_COUNT {
        WIDE_WINDOW_LINES
    } else {
        NARROW_WINDOW_LINES
    };

    let mut out = String::from("## Graph\n");
    for chain in maximal_simple_chains(input.edges) {
        out.push_str(&render_chain(&chain, &by_id));
        out.push('\n');
    }

    out.push_str("\n## Nodes\n");
    for node in input.nodes {
        if Some(node.id.as_str()) == input.start {
            continue;
        }
        out.push_str(&render_node_block(node, window_lines, &read_file));
    }
    out
}

fn render_chain(chain: &[&Edge], by_id: &HashMap<&str, &Node>) -> String {
    let mut out = display_name(chain[0].source.as_str(), by_id);
    for edge in chain {
        out.push_str(" --");
        out.push_str(edge.kind.as_str());
        out.push_str("--> ");
        out.push_str(&display_name(edge.target.as_str(), by_id));
    }
    out
}

fn display_name(id: &str, by_id: &HashMap<&str, &Node>) -> String {
    by_id
        .get(id)
        .map(|n| n.name.clone())
        .unwrap_or_else(|| id.to_string())
}

fn render_node_block(node: &Node, window_lines: u32, read_file: &impl Fn(&str) -> Option<String>) -> String {
    let mut out = format!(
        "\n### {}\ntype: {}\nfile: {}\n",
        node.name, node.node_type, node.file_path
    );

    let Some(contents) = read_file(&node.file_path) else {
        return out;
    };
    let lines: Vec<&str> = contents.lines().collect();
    if lines.is_empty() {
        return out;
    }

    let half = window_lines / 2;
    let start = node.start_line.saturating_sub(half);
    let end = (node.end_line + half).min(lines.len().saturating_sub(1) as u32);
    out.push_str(&format!("offset: {start}\nlimit: {}\n", end.saturating_sub(start) + 1));

    // The node's own definition line is the one call-site line we can
    // attribute without per-call line data on `Edge`.
    for (offset, line) in lines[start as usize..=(end as usize).min(lines.len() - 1)]
        .iter()
        .enumerate()
    {
        let line_no = start + offset as u32;
        let marker = if line_no == node.start_line { ">" } else { " " };
        out.push_str(&format!("{marker} {line_no:>4} | {line}\n"));
    }
    out
}

/// Partitions `edges` into maximal simple chains (no repeated node within
/// one chain, no edge rendered twice across chains), walking from nodes
/// with no incoming edge first. A component with no such node (a cycle
/// covering it entirely) starts from its lexicographically-first source
/// so every edge still appears in some chain.
fn maximal_simple_chains(edges: &[Edge]) -> Vec<Vec<&Edge>> {
    if edges.is_empty() {
        return Vec::new();
    }
    let mut out_adj: HashMap<&str, Vec<&Edge>> = HashMap::new();
    let mut has_incoming: HashSet<&str> = HashSet::new();
    for e in edges {
        out_adj.entry(e.source.as_str()).or_default().push(e);
        has_incoming.insert(e.target.as_str());
    }
    for outs in out_adj.values_mut() {
        outs.sort_by(|a, b| a.target.cmp(&b.target));
    }

    let mut roots: Vec<&str> = out_adj
        .keys()
        .copied()
        .filter(|n| !has_incoming.contains(n))
        .collect();
    roots.sort();

    let mut chains = Vec::new();
    let mut used_edges: HashSet<(&str, &str)> = HashSet::new();
    for root in roots {
        let mut visited = HashSet::new();
        visited.insert(root);
        walk_chains(root, &out_adj, &mut used_edges, &mut visited, &mut Vec::new(), &mut chains);
    }

    // Leftover edges belong to cycles with no node lacking an incoming
    // edge; restart from the lexicographically-first unused edge's source
    // each time until every edge has appeared in some chain.
    loop {
        let next_root = edges
            .iter()
            .filter(|e| !used_edges.contains(&(e.source.as_str(), e.target.as_str())))
            .map(|e| e.source.as_str())
            .min();
        let Some(root) = next_root else { break };
        let mut visited = HashSet::new();
        visited.insert(root);
        walk_chains(root, &out_adj, &mut used_edges, &mut visited, &mut Vec::new(), &mut chains);
    }

    chains
}

fn walk_chains<'a>(
    node: &'a str,
    out_adj: &HashMap<&'a str, Vec<&'a Edge>>,
    used_edges: &mut HashSet<(&'a str, &'a str)>,
    visited: &mut HashSet<&'a str>,
    path: &mut Vec<&'a Edge>,
    chains: &mut Vec<Vec<&'a Edge>>,
) {
    let candidates: Vec<&'a Edge> = out_adj
        .get(node)
        .into_iter()
        .flatten()
        .filter(|e| {
            !used_edges.contains(&(e.source.as_str(), e.target.as_str()))
                && !visited.contains(e.target.as_str())
        })
        .copied()
        .collect();

    if candidates.is_empty() {
        if !path.is_empty() {
            chains.push(path.clone());
        }
        return;
    }

    for edge in candidates {
        used_edges.insert((edge.source.as_str(), edge.target.as_str()));
        visited.insert(edge.target.as_str());
        path.push(edge);
        walk_chains(edge.target.as_str(), out_adj, used_edges, visited, path, chains);
        path.pop();
        visited.remove(edge.target.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::RelationKind;
    use serde_json::json;

    fn node(id: &str, name: &str, start_line: u32, end_line: u32) -> Node {
        Node {
            id: id.to_string(),
            node_type: "Function".to_string(),
            name: name.to_string(),
            package: None,
            module: None,
            file_path: "chain.ts".to_string(),
            start_line,
            end_line,
            exported: true,
            properties: json!({}),
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.to_string(),
            target: target.to_string(),
            kind: RelationKind::Calls,
            call_count: None,
            is_type_only: None,
            imported_symbols: None,
            context: None,
        }
    }

    #[test]
    fn renders_a_single_chain_for_a_linear_call_sequence() {
        let nodes = vec![
            node("chain.ts:entry", "entry", 0, 0),
            node("chain.ts:step02", "step02", 2, 2),
            node("chain.ts:step05", "step05", 10, 10),
        ];
        let edges = vec![edge("chain.ts:entry", "chain.ts:step02"), edge("chain.ts:step02", "chain.ts:step05")];
        let input = FormatInput {
            nodes: &nodes,
            edges: &edges,
            start: Some("chain.ts:entry"),
        };
        let out = format_markdown(&input, |_| None);
        assert!(out.contains("## Graph\nentry --CALLS--> step02 --CALLS--> step05"));
        assert!(out.contains("### step02"));
        assert!(out.contains("### step05"));
        assert!(!out.contains("### entry"));
    }

    #[test]
    fn node_block_marks_the_definition_line() {
        let nodes = vec![node("chain.ts:helper", "helper", 2, 3)];
        let input = FormatInput {
            nodes: &nodes,
            edges: &[],
            start: None,
        };
        let file = "line0\nline1\nfunction helper() {\n  body\n}\n";
        let out = format_markdown(&input, |_| Some(file.to_string()));
        assert!(out.contains("> "));
        assert!(out.contains("function helper"));
    }

    #[test]
    fn maximal_simple_chains_covers_every_edge_without_looping_on_cycles() {
        let edges = vec![edge("a", "b"), edge("b", "a")];
        let chains = maximal_simple_chains(&edges);
        let total: usize = chains.iter().map(|c| c.len()).sum();
        assert_eq!(total, 2);
    }
}
