//! Dependency graph construction and traversal for one resolution pass.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// Which adjacency to walk.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Walk {
    /// `a -> b` when `a` depends on `b`.
    Forward,
    /// `b -> a` when `a` depends on `b`.
    Reverse,
}

impl Walk {
    fn flip(self) -> Self {
        match self {
            Walk::Forward => Walk::Reverse,
            Walk::Reverse => Walk::Forward,
        }
    }
}

/// Concrete dependency edges between items, both directions built once.
///
/// Node `i` of either graph is the item registered at index `i`.
pub(crate) struct ActionGraph {
    forward: DiGraph<usize, ()>,
    reverse: DiGraph<usize, ()>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

struct Frame {
    node: usize,
    successors: Vec<usize>,
    next: usize,
}

impl ActionGraph {
    pub fn new(node_count: usize) -> Self {
        let mut forward = DiGraph::with_capacity(node_count, node_count);
        let mut reverse = DiGraph::with_capacity(node_count, node_count);
        for i in 0..node_count {
            forward.add_node(i);
            reverse.add_node(i);
        }
        Self { forward, reverse }
    }

    /// Record that `from` depends on `to`. Duplicate edges are ignored.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        let (a, b) = (NodeIndex::new(from), NodeIndex::new(to));
        if self.forward.find_edge(a, b).is_none() {
            self.forward.add_edge(a, b, ());
            self.reverse.add_edge(b, a, ());
        }
    }

    /// Items depending on `idx`, in registration order.
    pub fn dependents_of(&self, idx: usize) -> Vec<usize> {
        self.successors(Walk::Reverse, idx)
    }

    fn graph(&self, walk: Walk) -> &DiGraph<usize, ()> {
        match walk {
            Walk::Forward => &self.forward,
            Walk::Reverse => &self.reverse,
        }
    }

    fn successors(&self, walk: Walk, idx: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .graph(walk)
            .neighbors_directed(NodeIndex::new(idx), Direction::Outgoing)
            .map(|n| self.graph(walk)[n])
            .collect();
        out.sort_unstable();
        out
    }

    /// Depth-first search restricted to `members`, roots taken in registration
    /// order. Returns the first back edge as `(node on the stack, node reaching it)`.
    pub fn find_cycle(&self, members: &[bool], walk: Walk) -> Option<(usize, usize)> {
        let mut marks = vec![Mark::Unvisited; members.len()];

        for start in 0..members.len() {
            if !members[start] || marks[start] != Mark::Unvisited {
                continue;
            }
            marks[start] = Mark::OnStack;
            let mut stack = vec![Frame {
                node: start,
                successors: self.successors(walk, start),
                next: 0,
            }];

            while let Some(frame) = stack.last_mut() {
                let node = frame.node;
                let Some(succ) = frame.successors.get(frame.next).copied() else {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                };
                frame.next += 1;

                if !members[succ] {
                    continue;
                }
                match marks[succ] {
                    Mark::OnStack => return Some((succ, node)),
                    Mark::Done => {}
                    Mark::Unvisited => {
                        marks[succ] = Mark::OnStack;
                        stack.push(Frame {
                            node: succ,
                            successors: self.successors(walk, succ),
                            next: 0,
                        });
                    }
                }
            }
        }
        None
    }

    /// Dependencies before dependents, ties broken by registration order.
    pub fn install_order(&self, members: &[bool]) -> Vec<usize> {
        self.stable_order(members, Walk::Forward)
    }

    /// Dependents before dependencies, ties broken by registration order.
    pub fn removal_order(&self, members: &[bool]) -> Vec<usize> {
        self.stable_order(members, Walk::Reverse)
    }

    /// Kahn's algorithm: a member is ready once every member it reaches via
    /// `walk` has been emitted. The graph must be acyclic over `members`.
    fn stable_order(&self, members: &[bool], walk: Walk) -> Vec<usize> {
        let mut pending = vec![0usize; members.len()];
        let mut ready = BinaryHeap::new();

        for idx in (0..members.len()).filter(|&i| members[i]) {
            pending[idx] = self
                .successors(walk, idx)
                .into_iter()
                .filter(|&s| members[s])
                .count();
            if pending[idx] == 0 {
                ready.push(Reverse(idx));
            }
        }

        let mut order = Vec::new();
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(idx);
            for waiting in self.successors(walk.flip(), idx) {
                if !members[waiting] {
                    continue;
                }
                pending[waiting] -= 1;
                if pending[waiting] == 0 {
                    ready.push(Reverse(waiting));
                }
            }
        }

        debug_assert_eq!(
            order.len(),
            members.iter().filter(|m| **m).count(),
            "ordering requested over a cyclic member set"
        );
        order
    }
}
