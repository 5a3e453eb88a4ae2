// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The hierarchical representation of test names.
//!
//! A test named `a.b.c` is stored as `{"a": {"b": {"c": <leaf>}}}`, with the delimiter taken from
//! [`FullResults::path_delimiter`](crate::FullResults::path_delimiter).

use crate::{TestLeaf, errors::TrieInsertError};
use indexmap::{IndexMap, map::Entry};
use serde::{Deserialize, Serialize};

/// A trie of test results, keyed by path segment.
///
/// Children are kept in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestTrie {
    nodes: IndexMap<String, TrieNode>,
}

/// A node in a [`TestTrie`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrieNode {
    /// The result of a single test.
    Leaf(TestLeaf),

    /// A group of tests sharing a path prefix.
    Directory(TestTrie),
}

impl TestTrie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the trie contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for a single path segment directly under this trie.
    pub fn get_node(&self, segment: &str) -> Option<&TrieNode> {
        self.nodes.get(segment)
    }

    /// Iterates over the direct children of this trie.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &TrieNode)> + '_ {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Looks up the leaf for a full test path.
    pub fn get(&self, path: &str, delimiter: &str) -> Option<&TestLeaf> {
        let (parents, name) = split_last_segment(path, delimiter);
        let mut current = self;
        if let Some(parents) = parents {
            for segment in parents.split(delimiter) {
                match current.nodes.get(segment)? {
                    TrieNode::Directory(trie) => current = trie,
                    TrieNode::Leaf(_) => return None,
                }
            }
        }
        match current.nodes.get(name)? {
            TrieNode::Leaf(leaf) => Some(leaf),
            TrieNode::Directory(_) => None,
        }
    }

    /// Inserts a leaf at `path`, creating a directory node for every segment but the last.
    ///
    /// An empty delimiter stores the whole path as a single segment.
    pub fn insert(
        &mut self,
        path: &str,
        delimiter: &str,
        leaf: TestLeaf,
    ) -> Result<(), TrieInsertError> {
        if path.is_empty() || (!delimiter.is_empty() && path.split(delimiter).any(str::is_empty)) {
            return Err(TrieInsertError::EmptySegment {
                path: path.to_owned(),
            });
        }

        let (parents, name) = split_last_segment(path, delimiter);
        let mut current = self;
        if let Some(parents) = parents {
            let mut prefix_len = 0;
            for segment in parents.split(delimiter) {
                prefix_len += segment.len();
                current = match current
                    .nodes
                    .entry(segment.to_owned())
                    .or_insert_with(|| TrieNode::Directory(TestTrie::new()))
                {
                    TrieNode::Directory(trie) => trie,
                    TrieNode::Leaf(_) => {
                        return Err(TrieInsertError::PrefixIsLeaf {
                            path: path.to_owned(),
                            prefix: path[..prefix_len].to_owned(),
                        });
                    }
                };
                prefix_len += delimiter.len();
            }
        }

        match current.nodes.entry(name.to_owned()) {
            Entry::Vacant(entry) => {
                entry.insert(TrieNode::Leaf(leaf));
                Ok(())
            }
            Entry::Occupied(entry) => match entry.get() {
                TrieNode::Leaf(_) => Err(TrieInsertError::AlreadyPresent {
                    path: path.to_owned(),
                }),
                TrieNode::Directory(_) => Err(TrieInsertError::HasChildren {
                    path: path.to_owned(),
                }),
            },
        }
    }

    /// Returns all leaves with their full paths, depth-first in insertion order.
    pub fn leaves(&self, delimiter: &str) -> Vec<(String, &TestLeaf)> {
        let mut out = Vec::new();
        self.collect_leaves(None, delimiter, &mut out);
        out
    }

    fn collect_leaves<'a>(
        &'a self,
        prefix: Option<&str>,
        delimiter: &str,
        out: &mut Vec<(String, &'a TestLeaf)>,
    ) {
        for (segment, node) in &self.nodes {
            // Parsed documents may contain empty segments, so the root is `None` rather than "".
            let path = match prefix {
                Some(prefix) => format!("{prefix}{delimiter}{segment}"),
                None => segment.clone(),
            };
            match node {
                TrieNode::Leaf(leaf) => out.push((path, leaf)),
                TrieNode::Directory(trie) => trie.collect_leaves(Some(&path), delimiter, out),
            }
        }
    }
}

/// Splits `path` into everything before the last delimiter, and the last segment.
fn split_last_segment<'a>(path: &'a str, delimiter: &str) -> (Option<&'a str>, &'a str) {
    if delimiter.is_empty() {
        return (None, path);
    }
    match path.rsplit_once(delimiter) {
        Some((parents, name)) => (Some(parents), name),
        None => (None, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActualResults;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn pass_leaf() -> TestLeaf {
        TestLeaf::expecting_pass("PASS".parse::<ActualResults>().unwrap())
    }

    fn fail_leaf() -> TestLeaf {
        TestLeaf::expecting_pass("FAIL".parse::<ActualResults>().unwrap())
    }

    #[test]
    fn insert_shared_prefix() {
        let mut trie = TestTrie::new();
        trie.insert("a.b.c", ".", pass_leaf()).unwrap();
        trie.insert("a.b.d", ".", fail_leaf()).unwrap();
        trie.insert("e", ".", pass_leaf()).unwrap();

        assert_eq!(
            serde_json::to_value(&trie).unwrap(),
            json!({
                "a": {
                    "b": {
                        "c": {"expected": "PASS", "actual": "PASS"},
                        "d": {"expected": "PASS", "actual": "FAIL", "is_unexpected": true},
                    },
                },
                "e": {"expected": "PASS", "actual": "PASS"},
            })
        );

        assert_eq!(trie.get("a.b.c", "."), Some(&pass_leaf()));
        assert_eq!(trie.get("a.b.d", "."), Some(&fail_leaf()));
        assert_eq!(trie.get("a.b", "."), None);
        assert_eq!(trie.get("a.b.c.x", "."), None);

        let paths: Vec<_> = trie
            .leaves(".")
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(paths, ["a.b.c", "a.b.d", "e"]);
    }

    #[test]
    fn insert_custom_delimiter() {
        let mut trie = TestTrie::new();
        trie.insert("suite::module::test", "::", pass_leaf()).unwrap();
        trie.insert("suite::other", "::", pass_leaf()).unwrap();

        assert_eq!(
            serde_json::to_value(&trie).unwrap(),
            json!({
                "suite": {
                    "module": {"test": {"expected": "PASS", "actual": "PASS"}},
                    "other": {"expected": "PASS", "actual": "PASS"},
                },
            })
        );
    }

    #[test_case(
        &["a.b"], "a.b",
        TrieInsertError::AlreadyPresent { path: "a.b".to_owned() }
        ; "duplicate"
    )]
    #[test_case(
        &["a.b"], "a.b.c",
        TrieInsertError::PrefixIsLeaf { path: "a.b.c".to_owned(), prefix: "a.b".to_owned() }
        ; "prefix is leaf"
    )]
    #[test_case(
        &["a.b.c"], "a.b",
        TrieInsertError::HasChildren { path: "a.b".to_owned() }
        ; "has children"
    )]
    #[test_case(
        &[], "a..b",
        TrieInsertError::EmptySegment { path: "a..b".to_owned() }
        ; "empty segment"
    )]
    #[test_case(
        &[], "",
        TrieInsertError::EmptySegment { path: "".to_owned() }
        ; "empty path"
    )]
    fn insert_conflicts(existing: &[&str], path: &str, expected: TrieInsertError) {
        let mut trie = TestTrie::new();
        for existing in existing {
            trie.insert(existing, ".", pass_leaf()).unwrap();
        }
        let before = trie.clone();

        let err = trie.insert(path, ".", pass_leaf()).unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(trie, before);
    }

    #[test]
    fn deserialize_nested() {
        let trie: TestTrie = serde_json::from_value(json!({
            "a": {
                "b": {"expected": "SKIP", "actual": "SKIP"},
                "c": {},
            },
        }))
        .unwrap();

        match trie.get_node("a") {
            Some(TrieNode::Directory(a)) => {
                assert_eq!(a.get_node("b"), Some(&TrieNode::Leaf(TestLeaf::skipped())));
                assert_eq!(a.get_node("c"), Some(&TrieNode::Directory(TestTrie::new())));
            }
            other => panic!("expected directory, found {other:?}"),
        }
    }

    #[test]
    fn leaves_with_empty_segments() {
        let trie: TestTrie = serde_json::from_value(json!({
            "a": {
                "": {"expected": "PASS", "actual": "PASS"},
                "b": {"": {"expected": "SKIP", "actual": "SKIP"}},
            },
            "": {"c": {"expected": "PASS", "actual": "FAIL", "is_unexpected": true}},
        }))
        .unwrap();

        let paths: Vec<_> = trie
            .leaves(".")
            .into_iter()
            .map(|(path, _)| path)
            .collect();
        assert_eq!(paths, ["a.", "a.b.", ".c"]);
    }
}
