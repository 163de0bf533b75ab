use std::collections::{HashMap, HashSet, VecDeque};

use super::task::Task;

/// Inverse of every task's `dependencies`: task id -> ids of the tasks that
/// depend on it, in task order.
///
/// Never patched in place; callers rebuild it after any structural change so
/// no stale edge can survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyIndex {
    dependents: HashMap<String, Vec<String>>,
}

impl DependencyIndex {
    pub fn build(tasks: &[Task]) -> Self {
        let known: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        for task in tasks {
            for dep in &task.dependencies {
                if !known.contains(dep.as_str()) {
                    tracing::warn!(task = %task.id, dependency = %dep, "dependency on unknown task");
                }
                let entry = dependents.entry(dep.clone()).or_default();
                if !entry.contains(&task.id) {
                    entry.push(task.id.clone());
                }
            }
        }
        Self { dependents }
    }

    /// Direct dependents of `id`.
    pub fn dependents_of(&self, id: &str) -> &[String] {
        self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every task reachable downstream of `id`, breadth first, excluding `id`
    /// itself. Visited ids are tracked, so cyclic input terminates.
    pub fn transitive_dependents(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut queue: VecDeque<&str> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(current) {
                if seen.insert(dependent.as_str()) {
                    out.push(dependent.clone());
                    queue.push_back(dependent.as_str());
                }
            }
        }
        out
    }

    pub fn edge_count(&self) -> usize {
        self.dependents.values().map(Vec::len).sum()
    }
}
