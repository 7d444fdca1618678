//! Build option catalogue served by `GET /build-options`.
//!
//! The catalogue is a tree: leaves are option lists, nodes map names to
//! sub-trees. A node's keys are themselves options (a killer's name, an item
//! type) whose leaf holds the dependent add-ons:
//!
//! ```text
//! killer
//! ├── characters { "The Trapper": [add-ons], ... }
//! ├── perks      [ ... ]
//! └── offerings  [ ... ]
//! survivor
//! ├── characters [ ... ]
//! ├── items      { "Flashlight": [add-ons], ... }
//! ├── perks      [ ... ]
//! └── offerings  [ ... ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::models::BuildType;

pub const CHARACTERS: &str = "characters";
pub const ITEMS: &str = "items";
pub const PERKS: &str = "perks";
pub const OFFERINGS: &str = "offerings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogueEntry {
    Leaf(Vec<String>),
    Node(BTreeMap<String, CatalogueEntry>),
}

impl CatalogueEntry {
    /// Selectable values at this entry: a leaf's list or a node's keys.
    pub fn values(&self) -> Vec<String> {
        let mut values = match self {
            CatalogueEntry::Leaf(values) => values.clone(),
            CatalogueEntry::Node(children) => children.keys().cloned().collect(),
        };
        values.sort();
        values.dedup();
        values
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalogue {
    root: CatalogueEntry,
}

impl Catalogue {
    pub fn lookup(&self, path: &[&str]) -> Option<&CatalogueEntry> {
        path.iter().try_fold(&self.root, |entry, key| match entry {
            CatalogueEntry::Node(children) => children.get(*key),
            CatalogueEntry::Leaf(_) => None,
        })
    }

    /// Sorted options at `path`; empty when the path does not exist.
    pub fn options(&self, path: &[&str]) -> Vec<String> {
        self.lookup(path).map(CatalogueEntry::values).unwrap_or_default()
    }

    /// Check the tree has the shape the build form relies on.
    pub fn check_layout(&self) -> Result<(), String> {
        for build_type in [BuildType::Killer, BuildType::Survivor] {
            let t = build_type.as_str();
            let (leaf_lists, dependent) = match build_type {
                BuildType::Killer => (vec![PERKS, OFFERINGS], CHARACTERS),
                BuildType::Survivor => (vec![CHARACTERS, PERKS, OFFERINGS], ITEMS),
            };
            for key in leaf_lists {
                match self.lookup(&[t, key]) {
                    Some(CatalogueEntry::Leaf(_)) => {}
                    _ => return Err(format!("build options: {}/{} must be a list", t, key)),
                }
            }
            match self.lookup(&[t, dependent]) {
                Some(CatalogueEntry::Node(children)) => {
                    if let Some((name, _)) = children
                        .iter()
                        .find(|(_, entry)| !matches!(entry, CatalogueEntry::Leaf(_)))
                    {
                        return Err(format!(
                            "build options: {}/{}/{} must be a list",
                            t, dependent, name
                        ));
                    }
                }
                _ => {
                    return Err(format!(
                        "build options: {}/{} must map names to add-ons",
                        t, dependent
                    ));
                }
            }
        }
        Ok(())
    }

    /// Every option group in the tree as `(path, values)`, depth first.
    /// Nodes contribute their keys as a group, then their children.
    pub fn groups(&self) -> Vec<(Vec<String>, Vec<String>)> {
        let mut out = Vec::new();
        collect_groups(&self.root, &mut Vec::new(), &mut out);
        out
    }
}

fn collect_groups(
    entry: &CatalogueEntry,
    path: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, Vec<String>)>,
) {
    match entry {
        CatalogueEntry::Leaf(_) => out.push((path.clone(), entry.values())),
        CatalogueEntry::Node(children) => {
            // The top two levels (build type, category) are structure, not options.
            if path.len() >= 2 {
                out.push((path.clone(), entry.values()));
            }
            for (key, child) in children {
                path.push(key.clone());
                collect_groups(child, path, out);
                path.pop();
            }
        }
    }
}
