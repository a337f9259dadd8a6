//! Structural diff between declared and on-chain configuration
//!
//! Both sides are compared as JSON objects. Every differing leaf becomes a
//! [`DiffNode::Leaf`] carrying the local value (`push`) and the remote value
//! (`pull`); equal leaves and subtrees with no differences are omitted.
//! Arrays are compared as whole values, never element by element.

use serde_json::{Map, Value};

/// A differing leaf or a subtree containing differences
#[derive(Debug, Clone, PartialEq)]
pub enum DiffNode {
    Leaf {
        /// Declared value, absent if the key only exists remotely
        push: Option<Value>,
        /// On-chain value, absent if the key only exists locally
        pull: Option<Value>,
    },
    Branch(DiffTree),
}

/// Ordered set of differences. Keys follow the local object's order,
/// then remote-only keys in the remote object's order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffTree {
    entries: Vec<(String, DiffNode)>,
}

impl DiffTree {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&DiffNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DiffNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every differing leaf with its dotted path
    pub fn leaves(&self) -> Vec<(String, &Option<Value>, &Option<Value>)> {
        let mut out = Vec::new();
        collect_leaves(self, "", &mut out);
        out
    }

    /// Some leaf carries a declared value. Remote-only leaves are left to `pull`.
    pub fn has_push(&self) -> bool {
        self.leaves().iter().any(|(_, push, _)| push.is_some())
    }

    /// Render as `{ key: { push, pull } }` JSON
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (key, node) in &self.entries {
            let value = match node {
                DiffNode::Leaf { push, pull } => {
                    let mut leaf = Map::new();
                    if let Some(push) = push {
                        leaf.insert("push".to_string(), push.clone());
                    }
                    if let Some(pull) = pull {
                        leaf.insert("pull".to_string(), pull.clone());
                    }
                    Value::Object(leaf)
                }
                DiffNode::Branch(tree) => tree.to_value(),
            };
            map.insert(key.clone(), value);
        }
        Value::Object(map)
    }

    fn push(&mut self, key: &str, node: DiffNode) {
        self.entries.push((key.to_string(), node));
    }
}

fn collect_leaves<'a>(
    tree: &'a DiffTree,
    prefix: &str,
    out: &mut Vec<(String, &'a Option<Value>, &'a Option<Value>)>,
) {
    for (key, node) in &tree.entries {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match node {
            DiffNode::Leaf { push, pull } => out.push((path, push, pull)),
            DiffNode::Branch(sub) => collect_leaves(sub, &path, out),
        }
    }
}

/// Diff two JSON objects key by key
pub fn diff_objects(local: &Map<String, Value>, remote: &Map<String, Value>) -> DiffTree {
    let mut tree = DiffTree::default();

    for (key, local_value) in local {
        match remote.get(key) {
            Some(remote_value) => {
                if let Some(node) = diff_entry(local_value, remote_value) {
                    tree.push(key, node);
                }
            }
            None => tree.push(
                key,
                DiffNode::Leaf {
                    push: Some(local_value.clone()),
                    pull: None,
                },
            ),
        }
    }

    for (key, remote_value) in remote {
        if !local.contains_key(key) {
            tree.push(
                key,
                DiffNode::Leaf {
                    push: None,
                    pull: Some(remote_value.clone()),
                },
            );
        }
    }

    tree
}

/// Diff two values that are expected to be objects.
///
/// Non-object inputs compare as a single root leaf under the key `""`.
pub fn diff_values(local: &Value, remote: &Value) -> DiffTree {
    match (local, remote) {
        (Value::Object(l), Value::Object(r)) => diff_objects(l, r),
        _ => {
            let mut tree = DiffTree::default();
            if let Some(node) = diff_entry(local, remote) {
                tree.push("", node);
            }
            tree
        }
    }
}

fn diff_entry(local: &Value, remote: &Value) -> Option<DiffNode> {
    match (local, remote) {
        (Value::Object(l), Value::Object(r)) => {
            let sub = diff_objects(l, r);
            if sub.is_empty() {
                None
            } else {
                Some(DiffNode::Branch(sub))
            }
        }
        _ if local == remote => None,
        _ => Some(DiffNode::Leaf {
            push: Some(local.clone()),
            pull: Some(remote.clone()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_nested_leaf_difference() {
        let diff = diff_objects(
            &obj(json!({"a": {"b": 1, "c": 2}})),
            &obj(json!({"a": {"b": 1, "c": 3}})),
        );
        assert_eq!(diff.to_value(), json!({"a": {"c": {"push": 2, "pull": 3}}}));
    }

    #[test]
    fn test_diff_with_self_is_empty() {
        let value = json!({
            "version": "1.1.0",
            "limits": {"outbound": "1.00", "inbound": {"Solana": "2.00"}},
            "list": [1, 2, 3]
        });
        assert!(diff_values(&value, &value).is_empty());
    }

    #[test]
    fn test_equal_subtrees_are_pruned() {
        let diff = diff_objects(
            &obj(json!({"same": {"x": {"y": 1}}, "other": 1})),
            &obj(json!({"same": {"x": {"y": 1}}, "other": 2})),
        );
        assert!(diff.get("same").is_none());
        assert_eq!(diff.len(), 1);
    }

    #[test]
    fn test_one_sided_keys() {
        let diff = diff_objects(
            &obj(json!({"local_only": true, "shared": 1})),
            &obj(json!({"shared": 1, "remote_only": "r"})),
        );
        assert_eq!(
            diff.to_value(),
            json!({"local_only": {"push": true}, "remote_only": {"pull": "r"}})
        );
    }

    #[test]
    fn test_type_mismatch_is_a_leaf() {
        let diff = diff_objects(&obj(json!({"a": {"b": 1}})), &obj(json!({"a": 5})));
        assert_eq!(
            diff.get("a"),
            Some(&DiffNode::Leaf {
                push: Some(json!({"b": 1})),
                pull: Some(json!(5))
            })
        );
    }

    #[test]
    fn test_arrays_compare_whole() {
        let diff = diff_objects(&obj(json!({"xs": [1, 2, 3]})), &obj(json!({"xs": [1, 2, 4]})));
        assert_eq!(diff.to_value(), json!({"xs": {"push": [1, 2, 3], "pull": [1, 2, 4]}}));
    }

    #[test]
    fn test_every_leaf_differs() {
        let local = obj(json!({"a": 1, "b": {"c": 2, "d": 3}, "e": "x"}));
        let remote = obj(json!({"a": 1, "b": {"c": 5, "d": 3}, "f": "y"}));
        let diff = diff_objects(&local, &remote);

        let paths: Vec<String> = diff.leaves().into_iter().map(|(p, _, _)| p).collect();
        assert_eq!(paths, vec!["b.c", "e", "f"]);
        for (_, push, pull) in diff.leaves() {
            assert_ne!(push, pull);
        }
    }

    #[test]
    fn test_deterministic_order() {
        let local = obj(json!({"z": 1, "a": 1}));
        let remote = obj(json!({"z": 2, "a": 2}));
        let first = diff_objects(&local, &remote);
        let second = diff_objects(&local, &remote);
        assert_eq!(first, second);
        let keys: Vec<&str> = first.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn test_remote_only_keys_have_nothing_to_push() {
        let local = obj(json!({"limits": {"outbound": "1.00"}}));
        let remote = obj(json!({
            "paused": true,
            "limits": {"outbound": "1.00", "inbound": {"Solana": "2.00"}}
        }));
        let diff = diff_objects(&local, &remote);
        assert_eq!(diff.len(), 2);
        assert!(!diff.has_push());

        let diff = diff_objects(&obj(json!({"paused": false})), &obj(json!({"paused": true})));
        assert!(diff.has_push());
    }
}
