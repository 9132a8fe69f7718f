//! Deterministic ordering of cached entity lists
//!
//! Sorting is stable and descending on the active metric; re-applying it to
//! the same input always yields the same order.

use std::cmp::Ordering;

use crate::domain::{NodeSnapshot, PodSnapshot, SortKey};

/// Sort pods by cpu millicores or memory bytes, highest first
pub fn sort_pods(pods: &mut [PodSnapshot], key: SortKey) {
    match key {
        SortKey::Cpu => pods.sort_by(|a, b| b.cpu_millicores.cmp(&a.cpu_millicores)),
        SortKey::Memory => pods.sort_by(|a, b| b.memory_bytes.cmp(&a.memory_bytes)),
    }
}

/// Sort nodes by cpu or memory ratio, highest first
pub fn sort_nodes(nodes: &mut [NodeSnapshot], key: SortKey) {
    let metric = |n: &NodeSnapshot| match key {
        SortKey::Cpu => n.cpu_ratio,
        SortKey::Memory => n.memory_ratio,
    };
    nodes.sort_by(|a, b| descending(metric(a), metric(b)));
}

#[inline]
fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(name: &str, cpu: u64, memory: u64) -> PodSnapshot {
        PodSnapshot {
            name: name.to_string(),
            cpu_millicores: cpu,
            memory_bytes: memory,
            ..PodSnapshot::default()
        }
    }

    fn names(pods: &[PodSnapshot]) -> Vec<&str> {
        pods.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_sort_pods_by_cpu_descending() {
        let mut pods = vec![pod("a", 120, 0), pod("b", 80, 0), pod("c", 200, 0)];
        sort_pods(&mut pods, SortKey::Cpu);
        let cpu: Vec<u64> = pods.iter().map(|p| p.cpu_millicores).collect();
        assert_eq!(cpu, vec![200, 120, 80]);
    }

    #[test]
    fn test_sort_pods_by_memory() {
        let mut pods = vec![pod("a", 1, 10), pod("b", 2, 30), pod("c", 3, 20)];
        sort_pods(&mut pods, SortKey::Memory);
        assert_eq!(names(&pods), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut pods = vec![pod("first", 100, 0), pod("second", 100, 0), pod("x", 50, 0)];
        sort_pods(&mut pods, SortKey::Cpu);
        assert_eq!(names(&pods), vec!["first", "second", "x"]);
    }

    #[test]
    fn test_toggle_round_trip_restores_order() {
        let mut pods = vec![pod("a", 3, 10), pod("b", 1, 30), pod("c", 2, 20)];
        sort_pods(&mut pods, SortKey::Cpu);
        let by_cpu = names(&pods).join(",");
        sort_pods(&mut pods, SortKey::Memory);
        sort_pods(&mut pods, SortKey::Cpu);
        assert_eq!(names(&pods).join(","), by_cpu);
    }

    #[test]
    fn test_sort_nodes() {
        let node = |name: &str, cpu: f64, memory: f64| NodeSnapshot {
            name: name.to_string(),
            cpu_ratio: cpu,
            memory_ratio: memory,
            ..NodeSnapshot::default()
        };
        let mut nodes = vec![node("a", 0.2, 0.9), node("b", 0.7, 0.1), node("c", 0.5, 0.5)];

        sort_nodes(&mut nodes, SortKey::Cpu);
        let order: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);

        sort_nodes(&mut nodes, SortKey::Memory);
        let order: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }
}
