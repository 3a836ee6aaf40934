use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::error::{NavError, Result};
use crate::page::{Page, PageName};

/// Every installed page, keyed by name.
#[derive(Debug, Default)]
pub struct PageRegistry {
    entries: HashMap<PageName, Page>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, page: Page) -> Result<()> {
        match self.entries.entry(page.name.clone()) {
            Entry::Occupied(entry) => Err(NavError::DuplicateName(entry.key().clone())),
            Entry::Vacant(vacant) => {
                vacant.insert(page);
                Ok(())
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Result<Page> {
        self.entries
            .remove(name)
            .ok_or_else(|| NavError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&Page> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Page> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Installed names in a stable order.
    pub fn names(&self) -> Vec<PageName> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.entries.values()
    }
}
