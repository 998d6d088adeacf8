//! Memoized directed-graph traversal for artifact walks

use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Adapter exposing a directed graph to the caching walker.
pub trait DirectedGraph {
    type Node: Copy + Eq + Hash;
    type Error;

    /// Visit a node, pushing its outgoing neighbors into `connected`.
    fn visit_node(
        &mut self,
        node: Self::Node,
        connected: &mut Vec<Self::Node>,
    ) -> Result<(), Self::Error>;

    /// Visit the edge between two nodes. Called for every outgoing edge of a
    /// visited node, including edges into nodes seen earlier.
    fn visit_edge(&mut self, from: Self::Node, to: Self::Node) -> Result<(), Self::Error>;
}

/// Depth-first walker that visits each node exactly once. The memo set keeps
/// traversal linear on diamond graphs and terminates cycles.
pub struct CachingGraphWalker<N> {
    seen: FxHashSet<N>,
    start: Vec<N>,
}

impl<N: Copy + Eq + Hash> CachingGraphWalker<N> {
    pub fn new() -> Self {
        Self {
            seen: FxHashSet::default(),
            start: Vec::new(),
        }
    }

    pub fn add(&mut self, node: N) {
        self.start.push(node);
    }

    pub fn find_values<G>(&mut self, graph: &mut G) -> Result<(), G::Error>
    where
        G: DirectedGraph<Node = N>,
    {
        // start nodes are processed in registration order
        let mut stack: Vec<N> = std::mem::take(&mut self.start);
        stack.reverse();
        let mut connected = Vec::new();

        while let Some(node) = stack.pop() {
            if !self.seen.insert(node) {
                continue;
            }
            connected.clear();
            graph.visit_node(node, &mut connected)?;
            for &next in connected.iter() {
                graph.visit_edge(node, next)?;
            }
            for &next in connected.iter().rev() {
                if !self.seen.contains(&next) {
                    stack.push(next);
                }
            }
        }
        Ok(())
    }
}

impl<N: Copy + Eq + Hash> Default for CachingGraphWalker<N> {
    fn default() -> Self {
        Self::new()
    }
}
