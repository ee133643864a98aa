use super::cell::Cell;
use super::site::AtomSite;
use std::collections::BTreeMap;

/// A finished atomic structure: ordered atoms, a periodic cell, periodicity flags and
/// free-form metadata.
///
/// A `Structure` is assembled once, fully populated, and is read-only afterwards; there
/// are no mutable accessors. The order of `sites` is significant: it is the generation
/// order that species alternation was defined on, and the order atoms are serialized in.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    sites: Vec<AtomSite>,
    cell: Cell,
    pbc: [bool; 3],
    metadata: BTreeMap<String, String>,
}

impl Structure {
    /// Creates a structure from its parts.
    ///
    /// Site indices are renumbered to match their position in `sites`.
    pub fn new(
        mut sites: Vec<AtomSite>,
        cell: Cell,
        pbc: [bool; 3],
        metadata: BTreeMap<String, String>,
    ) -> Self {
        for (index, site) in sites.iter_mut().enumerate() {
            site.index = index;
        }
        Self {
            sites,
            cell,
            pbc,
            metadata,
        }
    }

    pub fn sites(&self) -> &[AtomSite] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn pbc(&self) -> [bool; 3] {
        self.pbc
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Species symbols in site order.
    pub fn species(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.species.as_str()).collect()
    }

    pub fn species_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for site in &self.sites {
            *counts.entry(site.species.as_str()).or_insert(0) += 1;
        }
        counts
    }
}
