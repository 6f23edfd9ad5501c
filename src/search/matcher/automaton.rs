use std::collections::VecDeque;

use crate::search::pattern::fold;

use super::Match;

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    /// Child links sorted by byte
    children: Vec<(u8, usize)>,
    fail: usize,
    /// Patterns ending here, including those inherited through `fail`
    outputs: Vec<usize>,
}

impl Node {
    fn child(&self, byte: u8) -> Option<usize> {
        self.children
            .binary_search_by_key(&byte, |&(b, _)| b)
            .ok()
            .map(|i| self.children[i].1)
    }
}

/// Multi-pattern automaton: a trie over all needles plus failure links.
///
/// Nodes live in one arena and refer to each other by index.
#[derive(Debug, Clone)]
pub struct Automaton {
    nodes: Vec<Node>,
    lengths: Vec<usize>,
    case_insensitive: bool,
}

impl Automaton {
    /// Needles must already be folded if `case_insensitive` is set.
    pub fn new(needles: &[Vec<u8>], case_insensitive: bool) -> Self {
        let mut nodes = vec![Node::default()];

        for (pattern, needle) in needles.iter().enumerate() {
            if needle.is_empty() {
                continue;
            }
            let mut current = ROOT;
            for &byte in needle {
                current = match nodes[current].child(byte) {
                    Some(next) => next,
                    None => {
                        let next = nodes.len();
                        nodes.push(Node::default());
                        let children = &mut nodes[current].children;
                        let at = children.partition_point(|&(b, _)| b < byte);
                        children.insert(at, (byte, next));
                        next
                    }
                };
            }
            nodes[current].outputs.push(pattern);
        }

        // Breadth-first so a node's failure target is finished before it.
        let mut queue: VecDeque<usize> = nodes[ROOT].children.iter().map(|&(_, c)| c).collect();
        while let Some(parent) = queue.pop_front() {
            let children = nodes[parent].children.clone();
            for (byte, child) in children {
                let mut probe = nodes[parent].fail;
                let fail = loop {
                    if let Some(next) = nodes[probe].child(byte) {
                        break next;
                    }
                    if probe == ROOT {
                        break ROOT;
                    }
                    probe = nodes[probe].fail;
                };
                nodes[child].fail = fail;

                let inherited = nodes[fail].outputs.clone();
                nodes[child].outputs.extend(inherited);
                queue.push_back(child);
            }
        }

        Self {
            nodes,
            lengths: needles.iter().map(Vec::len).collect(),
            case_insensitive,
        }
    }

    /// Every occurrence of every needle in one left-to-right pass, ordered
    /// by start offset then pattern index.
    pub fn find_all(&self, text: &[u8]) -> Vec<Match> {
        let mut found = Vec::new();
        let mut state = ROOT;

        for (i, &raw) in text.iter().enumerate() {
            let byte = fold(raw, self.case_insensitive);
            state = loop {
                if let Some(next) = self.nodes[state].child(byte) {
                    break next;
                }
                if state == ROOT {
                    break ROOT;
                }
                state = self.nodes[state].fail;
            };

            for &pattern in &self.nodes[state].outputs {
                found.push(Match {
                    pattern,
                    offset: i + 1 - self.lengths[pattern],
                });
            }
        }

        found.sort_unstable_by_key(|m| (m.offset, m.pattern));
        found
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
