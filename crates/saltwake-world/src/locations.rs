//! Named places on the grid ("home", "dock_main", "tavern", ...)

use std::collections::BTreeMap;

use saltwake_core::Cell;
use serde::{Deserialize, Serialize};

/// Lookup from location name to grid cell
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocationTable {
    places: BTreeMap<String, Cell>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, cell: Cell) -> Self {
        self.insert(name, cell);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, cell: Cell) {
        self.places.insert(name.into(), cell);
    }

    pub fn get(&self, name: &str) -> Option<Cell> {
        self.places.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.places.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Cell)> {
        self.places.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let table = LocationTable::new()
            .with("tavern", Cell::new(4, 2))
            .with("dock_main", Cell::new(9, 9));
        assert_eq!(table.get("tavern"), Some(Cell::new(4, 2)));
        assert_eq!(table.get("church"), None);
        assert_eq!(table.len(), 2);
        assert!(table.contains("dock_main"));
    }

    #[test]
    fn test_iter_is_sorted_by_name() {
        let table = LocationTable::new()
            .with("tavern", Cell::new(0, 0))
            .with("barracks", Cell::new(1, 1));
        let names: Vec<&str> = table.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["barracks", "tavern"]);
    }
}
