//! Union-find over concept names (§9 "Identity aliasing across mutable
//! maps"), with path compression.

use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct IdentityTable {
    parent: FxHashMap<String, String>,
}

impl IdentityTable {
    /// The canonical representative of `name`'s set; `name` itself if it
    /// has never been aliased.
    pub fn find(&mut self, name: &str) -> String {
        let parent = match self.parent.get(name) {
            Some(p) => p.clone(),
            None => return name.to_string(),
        };
        if parent == name {
            return parent;
        }
        let root = self.find(&parent);
        self.parent.insert(name.to_string(), root.clone());
        root
    }

    /// Read-only lookup that does not path-compress (for use when only a
    /// shared `&self` is available).
    pub fn find_immutable(&self, name: &str) -> String {
        let mut current = name.to_string();
        let mut seen = std::collections::HashSet::new();
        while let Some(parent) = self.parent.get(&current) {
            if parent == &current || !seen.insert(current.clone()) {
                break;
            }
            current = parent.clone();
        }
        current
    }

    /// Points `alias`'s root at `canonical`'s root. Returns the merged
    /// root (always `canonical`'s root, per §4.4's "alias → canonical"
    /// direction).
    pub fn union(&mut self, alias: &str, canonical: &str) -> String {
        let alias_root = self.find(alias);
        let canonical_root = self.find(canonical);
        if alias_root != canonical_root {
            self.parent.insert(alias_root, canonical_root.clone());
        }
        self.parent.entry(canonical_root.clone()).or_insert_with(|| canonical_root.clone());
        canonical_root
    }

    /// The raw parent-pointer map, for checkpoint serialization.
    pub fn entries(&self) -> &FxHashMap<String, String> {
        &self.parent
    }

    /// Rebuilds a table from a previously saved parent-pointer map (used by
    /// checkpoint restore).
    pub fn from_entries(parent: FxHashMap<String, String>) -> Self {
        IdentityTable { parent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unaliased_name_is_its_own_root() {
        let mut table = IdentityTable::default();
        assert_eq!(table.find("{x}"), "{x}");
    }

    #[test]
    fn union_redirects_alias_to_canonical() {
        let mut table = IdentityTable::default();
        table.union("{alias}", "{canonical}");
        assert_eq!(table.find("{alias}"), "{canonical}");
        assert_eq!(table.find("{canonical}"), "{canonical}");
    }

    #[test]
    fn chained_aliases_compress_to_same_root() {
        let mut table = IdentityTable::default();
        table.union("{b}", "{c}");
        table.union("{a}", "{b}");
        assert_eq!(table.find("{a}"), "{c}");
    }
}
