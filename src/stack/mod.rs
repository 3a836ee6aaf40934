//! Navigation stack of page names. The top is the page on screen.

use crate::error::{NavError, Result};
use crate::page::PageName;

#[derive(Debug, Default, Clone)]
pub struct PageStack {
    // Bottom first.
    entries: Vec<PageName>,
}

impl PageStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<PageName>) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(NavError::AlreadyOnStack(name));
        }
        self.entries.push(name);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<PageName> {
        self.entries.pop()
    }

    pub fn top(&self) -> Option<&PageName> {
        self.entries.last()
    }

    /// Entry directly beneath the top.
    pub fn below_top(&self) -> Option<&PageName> {
        self.entries.len().checked_sub(2).map(|idx| &self.entries[idx])
    }

    pub fn bottom(&self) -> Option<&PageName> {
        self.entries.first()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names from the top down.
    pub fn names(&self) -> Vec<PageName> {
        self.entries.iter().rev().cloned().collect()
    }
}
