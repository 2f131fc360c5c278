use std::collections::HashSet;

/// Step dependency graph (DAG) indexed by step position.
#[derive(Debug, Clone)]
pub struct StepGraph {
    /// edges[i] = steps that step i depends on
    edges: Vec<Vec<usize>>,
}

impl StepGraph {
    pub fn new(edges: Vec<Vec<usize>>) -> Self {
        Self { edges }
    }

    /// Detects circular dependencies using DFS.
    ///
    /// Returns the cycle path, e.g. `"0 -> 2 -> 1 -> 0"`.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of steps, E = number of dependencies
    pub fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for node in 0..self.edges.len() {
            if !visited.contains(&node) && self.dfs_cycle(node, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(&self, node: usize, visited: &mut HashSet<usize>, stack: &mut Vec<usize>) -> bool {
        visited.insert(node);
        stack.push(node);

        if let Some(dependencies) = self.edges.get(node) {
            for &dep in dependencies {
                // 依赖在当前路径上：出现环
                if let Some(pos) = stack.iter().position(|&x| x == dep) {
                    stack.push(dep);
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(&dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

fn format_cycle_path(stack: &[usize]) -> String {
    stack
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_cycle_path() {
        let g = StepGraph::new(vec![vec![2], vec![0], vec![1]]);
        assert_eq!(g.detect_cycle().as_deref(), Some("0 -> 2 -> 1 -> 0"));
    }

    #[test]
    fn acyclic_graph_passes() {
        let g = StepGraph::new(vec![vec![], vec![0], vec![0, 1]]);
        assert!(g.detect_cycle().is_none());
    }
}
