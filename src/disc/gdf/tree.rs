//! Name search over a directory table's binary tree links
//!
//! Each entry's `subtree_l`/`subtree_r` are indices into the same table. The
//! tree is rooted at the first record on disk and ordered by name, compared
//! ASCII case-insensitively. Malformed links (out of range, or forming a
//! cycle) end the walk instead of failing.

use std::cmp::Ordering;

use super::directory::{DirectoryEntry, DirectoryTable};

/// Which child link of an entry to follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl DirectoryTable {
    /// Map one of an entry's child links to the record it points at
    pub fn child(&self, entry: &DirectoryEntry, side: Side) -> Option<&DirectoryEntry> {
        let index = match side {
            Side::Left => entry.left(),
            Side::Right => entry.right(),
        }?;
        self.get(index)
    }

    /// Find an entry by name by walking the tree from its root
    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        let mut node = self.get(0)?;

        // A valid walk visits each entry at most once
        for _ in 0..self.len() {
            let side = match compare_names(name, &node.name) {
                Ordering::Equal => return Some(node),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            node = self.child(node, side)?;
        }

        log::warn!(
            "Directory tree at sector {} loops; giving up search for {:?}",
            self.location().sector,
            name
        );
        None
    }

    /// Entries reachable from the tree root, in name order
    pub fn in_order(&self) -> Vec<&DirectoryEntry> {
        let mut ordered = Vec::with_capacity(self.len());
        let mut visited = vec![false; self.len()];
        let mut stack: Vec<usize> = Vec::new();
        let mut current = if self.is_empty() { None } else { Some(0) };

        loop {
            while let Some(index) = current {
                if index >= self.len() {
                    break;
                }
                if visited[index] {
                    log::warn!(
                        "Directory tree at sector {} revisits entry {}; skipping",
                        self.location().sector,
                        index
                    );
                    break;
                }
                visited[index] = true;
                stack.push(index);
                current = self.entries()[index].left();
            }

            let Some(index) = stack.pop() else {
                break;
            };
            let entry = &self.entries()[index];
            ordered.push(entry);
            current = entry.right();
        }

        ordered
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_uppercase())
        .cmp(b.bytes().map(|c| c.to_ascii_uppercase()))
}
