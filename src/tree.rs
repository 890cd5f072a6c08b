//! Record of every node visited (or pruned) by one search
//!
//! Nodes live in a flat arena indexed by [`NodeId`]. Ids are handed out in the
//! order nodes are created, so a parent always has a smaller id than its
//! children. Parent links are plain indices used for lookup only.

use serde::Serialize;

use std::collections::BTreeMap;
use std::fmt::Write;

pub type NodeId = usize;

/// Why recursion stopped at a node
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TerminalKind {
    /// The game was won
    Win,
    /// The board was full
    Draw,
    /// The depth budget ran out
    Leaf,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "node_type", rename_all = "UPPERCASE")]
pub enum NodeKind {
    Max { best_move: Option<usize> },
    Min { best_move: Option<usize> },
    Chance,
    Terminal { terminal_type: TerminalKind },
}

impl NodeKind {
    fn symbol(&self) -> char {
        match self {
            NodeKind::Max { .. } => '▲',
            NodeKind::Min { .. } => '▼',
            NodeKind::Chance => '◆',
            NodeKind::Terminal { .. } => '●',
        }
    }
}

/// Alpha-beta window as it was when a node was created
///
/// Unbounded sides are infinite and export as `null` in JSON.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Bounds {
    pub alpha: f64,
    pub beta: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchNode {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Remaining depth budget
    pub depth: u32,
    /// The column that produced this node, `None` at the root
    pub column: Option<usize>,
    /// Probability of reaching this node from its chance-node parent
    pub probability: Option<f64>,
    pub kind: NodeKind,
    /// Only recorded by alpha-beta searches
    pub bounds: Option<Bounds>,
    /// Board text from [`Board::snapshot`](crate::Board::snapshot), absent on pruned nodes
    pub board: Option<String>,
    pub children: Vec<NodeId>,
    /// Backed-up value, absent on pruned nodes
    pub value: Option<f64>,
    pub pruned: bool,
}

impl SearchNode {
    pub fn best_move(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Max { best_move } | NodeKind::Min { best_move } => best_move,
            _ => None,
        }
    }

    pub(crate) fn set_best_move(&mut self, column: Option<usize>) {
        match &mut self.kind {
            NodeKind::Max { best_move } | NodeKind::Min { best_move } => *best_move = column,
            _ => {}
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }
}

/// Search-wide facts stored alongside the tree
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeMetadata {
    pub algorithm: String,
    pub max_depth: u32,
    /// Number of node ids handed out, pruned placeholders included
    pub total_nodes: usize,
    pub best_move: Option<usize>,
    pub best_value: f64,
    /// Wall-clock search time in seconds
    pub computation_time: f64,
    /// 1 or 2, the side to move at the root
    pub current_turn: u8,
    pub board_width: usize,
    pub board_height: usize,
}

/// Node counts gathered by walking the tree from the root
///
/// `max_nodes`, `min_nodes`, `chance_nodes` and `terminal` partition `total`;
/// pruned placeholders are only counted in `pruned`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub total: usize,
    pub max_nodes: usize,
    pub min_nodes: usize,
    pub chance_nodes: usize,
    pub terminal: usize,
    pub pruned: usize,
    pub nodes_by_depth: BTreeMap<u32, usize>,
}

/// Nested, self-describing form of a node and its subtree
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub depth: u32,
    #[serde(rename = "move")]
    pub column: Option<usize>,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    pub board_state: Option<String>,
    pub value: Option<f64>,
    pub pruned: bool,
    pub children: Vec<NodeRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeSnapshot {
    pub root: NodeRecord,
    pub metadata: Option<TreeMetadata>,
}

/// One row of the flattened board view
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub id: NodeId,
    pub depth: u32,
    pub column: Option<usize>,
    pub board: String,
}

#[derive(Clone, Debug, Default)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    metadata: Option<TreeMetadata>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node and links it under `parent`, returning its id
    pub(crate) fn open(
        &mut self,
        parent: Option<NodeId>,
        depth: u32,
        column: Option<usize>,
        kind: NodeKind,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SearchNode {
            id,
            parent,
            depth,
            column,
            probability: None,
            kind,
            bounds: None,
            board: None,
            children: Vec::new(),
            value: None,
            pruned: false,
        });
        if let Some(parent) = parent {
            self.nodes[parent].children.push(id);
        }
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id]
    }

    pub(crate) fn set_metadata(&mut self, metadata: TreeMetadata) {
        self.metadata = Some(metadata);
    }

    pub fn metadata(&self) -> Option<&TreeMetadata> {
        self.metadata.as_ref()
    }

    pub fn get(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<&SearchNode> {
        self.nodes.first()
    }

    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<&SearchNode> {
        self.get(id)?.parent.and_then(|parent| self.get(parent))
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SearchNode> + '_ {
        self.get(id)
            .into_iter()
            .flat_map(move |node| node.children.iter().map(move |&child| &self.nodes[child]))
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        if !self.is_empty() {
            self.count(0, &mut stats);
        }
        stats
    }

    fn count(&self, id: NodeId, stats: &mut TreeStats) {
        let node = &self.nodes[id];
        if node.pruned {
            stats.pruned += 1;
            return;
        }

        stats.total += 1;
        *stats.nodes_by_depth.entry(node.depth).or_insert(0) += 1;
        match node.kind {
            NodeKind::Max { .. } => stats.max_nodes += 1,
            NodeKind::Min { .. } => stats.min_nodes += 1,
            NodeKind::Chance => stats.chance_nodes += 1,
            NodeKind::Terminal { .. } => stats.terminal += 1,
        }

        for &child in node.children.iter() {
            self.count(child, stats);
        }
    }

    /// Nested record of the subtree rooted at `id`
    pub fn record(&self, id: NodeId) -> Option<NodeRecord> {
        let node = self.get(id)?;
        Some(NodeRecord {
            id: node.id,
            parent_id: node.parent,
            depth: node.depth,
            column: node.column,
            kind: node.kind,
            alpha: node.bounds.map(|b| b.alpha),
            beta: node.bounds.map(|b| b.beta),
            probability: node.probability,
            board_state: node.board.clone(),
            value: node.value,
            pruned: node.pruned,
            children: node
                .children
                .iter()
                .filter_map(|&child| self.record(child))
                .collect(),
        })
    }

    pub fn to_record(&self) -> Option<TreeSnapshot> {
        Some(TreeSnapshot {
            root: self.record(0)?,
            metadata: self.metadata.clone(),
        })
    }

    /// Pretty JSON of the whole tree and its metadata; an empty tree exports as `null`
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_record())
    }

    /// The board of every evaluated node, in id order
    pub fn board_views(&self) -> Vec<BoardView> {
        self.nodes
            .iter()
            .filter_map(|node| {
                node.board.as_ref().map(|board| BoardView {
                    id: node.id,
                    depth: node.depth,
                    column: node.column,
                    board: board.clone(),
                })
            })
            .collect()
    }

    /// Indented text rendering, one node per line
    pub fn outline(&self) -> String {
        let mut out = String::new();
        if !self.is_empty() {
            self.outline_node(0, 0, &mut out);
        }
        out
    }

    fn outline_node(&self, id: NodeId, level: usize, out: &mut String) {
        let node = &self.nodes[id];
        let indent = "  ".repeat(level);
        let label = match node.column {
            Some(column) => format!("Col {}", column),
            None => "ROOT".to_string(),
        };

        if node.pruned {
            let _ = writeln!(out, "{}✂ [{}] pruned", indent, label);
            return;
        }

        let _ = write!(out, "{}{} [{}]", indent, node.kind.symbol(), label);
        if let Some(probability) = node.probability {
            let _ = write!(out, " P={:.1}%", probability * 100.0);
        }
        if let NodeKind::Terminal { terminal_type } = node.kind {
            let _ = write!(out, " {:?}", terminal_type);
        }
        match node.value {
            Some(value) => {
                let _ = write!(out, " Value: {:+.1}", value);
            }
            None => out.push_str(" Value: ?"),
        }
        if let Some(best_move) = node.best_move() {
            let _ = write!(out, " Best: Col {}", best_move);
        }
        out.push('\n');

        for &child in node.children.iter() {
            self.outline_node(child, level + 1, out);
        }
    }
}
