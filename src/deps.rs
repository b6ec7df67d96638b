use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Result, StackError};

#[derive(Debug, Clone)]
pub struct DepNode {
    pub key: String,                // declaration name
    pub requires: BTreeSet<String>, // names that must come first
}

/// Kahn's algorithm over `nodes`.
/// - Every `requires` entry must be a node in the list.
/// - Tie-break: key order, so the result never depends on insertion order.
/// - Cycles => error naming the stuck nodes.
pub fn topo_sort(nodes: &[DepNode]) -> Result<Vec<String>> {
    let mut indeg: BTreeMap<&str, usize> = BTreeMap::new();
    let mut outgoing: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for n in nodes {
        indeg.insert(&n.key, 0);
        outgoing.insert(&n.key, Vec::new());
    }

    for n in nodes {
        for dep in &n.requires {
            let Some(children) = outgoing.get_mut(dep.as_str()) else {
                return Err(StackError::UnresolvedReference {
                    from: n.key.clone(),
                    field: "requires".to_string(),
                    target: dep.clone(),
                });
            };
            // edge dep -> n
            children.push(&n.key);
            if let Some(d) = indeg.get_mut(n.key.as_str()) {
                *d += 1;
            }
        }
    }

    let mut ready: BTreeSet<&str> = indeg
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(k, _)| *k)
        .collect();

    let mut ordered: Vec<String> = Vec::with_capacity(nodes.len());

    while let Some(key) = ready.pop_first() {
        ordered.push(key.to_string());

        for child in outgoing.get(key).map(Vec::as_slice).unwrap_or_default() {
            if let Some(d) = indeg.get_mut(child) {
                *d -= 1;
                if *d == 0 {
                    ready.insert(*child);
                }
            }
        }
    }

    if ordered.len() != indeg.len() {
        let stuck: Vec<String> = indeg
            .iter()
            .filter(|(_, d)| **d > 0)
            .map(|(k, _)| k.to_string())
            .collect();
        return Err(StackError::Cycle(stuck));
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(key: &str, requires: &[&str]) -> DepNode {
        DepNode {
            key: key.to_string(),
            requires: requires.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn orders_dependencies_first_with_key_tie_break() {
        let nodes = vec![
            node("alias-record", &["cdn", "zone"]),
            node("cdn", &["bucket"]),
            node("zone", &[]),
            node("bucket", &[]),
        ];
        assert_eq!(
            topo_sort(&nodes).unwrap(),
            vec!["bucket", "cdn", "zone", "alias-record"]
        );
    }

    #[test]
    fn unknown_requirement_is_an_error() {
        let err = topo_sort(&[node("cdn", &["certificate"])]).unwrap_err();
        assert!(err.to_string().contains("certificate"));
    }

    #[test]
    fn cycles_are_reported() {
        let nodes = vec![node("a", &["b"]), node("b", &["a"]), node("c", &[])];
        match topo_sort(&nodes) {
            Err(StackError::Cycle(stuck)) => assert_eq!(stuck, vec!["a", "b"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }
}
