use std::collections::{BTreeMap, VecDeque};
use std::fmt::Debug;

/// Compute topological order of nodes using BFS.
///
/// Return node list in order and their levels. A node's level is one more
/// than the highest level among its predecessors. If the graph has a cycle,
/// the nodes that could not be ordered are returned as the error.
pub fn topo<Node: Copy + Ord + Debug>(
    nodes: impl Iterator<Item = Node> + Clone,
    edges: impl Iterator<Item = (Node, Node)> + Clone,
) -> Result<Vec<(Node, u32)>, Vec<Node>> {
    let mut degree_level: BTreeMap<Node, (u32, u32)> = BTreeMap::default();
    for (_, to) in edges.clone() {
        let entry = degree_level.entry(to).or_default();
        entry.0 += 1;
    }
    let mut que: VecDeque<Node> = VecDeque::new();
    let mut levels = Vec::new();
    for node in nodes {
        if degree_level.get(&node).map_or(0, |o| o.0) == 0 {
            que.push_back(node)
        }
    }
    while let Some(head) = que.pop_front() {
        let level = degree_level.remove(&head).map_or(0, |o| o.1);
        levels.push((head, level));
        for (from, to) in edges.clone() {
            if from == head {
                if let Some(entry) = degree_level.get_mut(&to) {
                    entry.0 -= 1;
                    entry.1 = entry.1.max(level + 1);
                    if entry.0 == 0 {
                        que.push_back(to);
                    }
                }
            }
        }
    }

    if !degree_level.is_empty() {
        return Err(degree_level.into_keys().collect());
    }

    Ok(levels)
}

/// Evaluation order of a circuit, as unit indices into its registry.
#[derive(Debug, Default, Clone)]
pub struct Schedule {
    pub(crate) order: Vec<usize>,
    levels: Vec<Vec<usize>>,
}

impl Schedule {
    pub(crate) fn from_levels(levels: Vec<(usize, u32)>) -> Self {
        let mut by_level: Vec<Vec<usize>> = Vec::new();
        for &(node, level) in &levels {
            let level = level as usize;
            if by_level.len() <= level {
                by_level.resize_with(level + 1, Vec::new);
            }
            by_level[level].push(node);
        }
        Self {
            order: levels.into_iter().map(|(node, _)| node).collect(),
            levels: by_level,
        }
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Units grouped by dependency depth. Units sharing a level never read
    /// each other's outputs.
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topo_levels() {
        // 0 -> 1 -> 3, 0 -> 2 -> 3, 4 isolated
        let edges = [(0, 1), (0, 2), (1, 3), (2, 3)];
        let levels = topo(0..5, edges.iter().copied()).unwrap();
        let pos = |n| levels.iter().position(|(m, _)| *m == n).unwrap();
        assert!(pos(0) < pos(1) && pos(1) < pos(3) && pos(2) < pos(3));
        let level_of = |n| levels[pos(n)].1;
        assert_eq!(level_of(3), 2);
        assert_eq!(level_of(4), 0);

        let schedule = Schedule::from_levels(levels);
        assert_eq!(schedule.levels().len(), 3);
        assert_eq!(schedule.order().len(), 5);
    }

    #[test]
    fn test_topo_cycle() {
        let edges = [(0, 1), (1, 2), (2, 1)];
        let err = topo(0..3, edges.iter().copied()).unwrap_err();
        assert_eq!(err, vec![1, 2]);

        let err = topo(0..1, [(0, 0)].iter().copied()).unwrap_err();
        assert_eq!(err, vec![0]);
    }
}
