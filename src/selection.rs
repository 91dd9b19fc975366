//! The caller's choice of pages, in output order.

use crate::pdf::{Error, Result};

/// An ordered sequence of zero-based page indices.
///
/// Order is the output page order. An index may appear more than once, in
/// which case the output carries that page more than once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    indices: Vec<usize>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `index` to the end of the selection.
    pub fn add(&mut self, index: usize) {
        self.indices.push(index);
    }

    /// Removes every occurrence of `index`. Returns whether anything was
    /// removed.
    pub fn remove(&mut self, index: usize) -> bool {
        let before = self.indices.len();
        self.indices.retain(|&i| i != index);
        self.indices.len() != before
    }

    /// Adds `index` if it is not selected, otherwise removes it. Returns
    /// whether `index` is selected afterwards.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.remove(index) {
            false
        } else {
            self.add(index);
            true
        }
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn to_ordered_sequence(&self) -> Vec<usize> {
        self.indices.clone()
    }

    /// Checks every index against a document of `page_count` pages,
    /// reporting the first that falls outside it.
    pub fn validate(&self, page_count: usize) -> Result<()> {
        match self.indices.iter().find(|&&index| index >= page_count) {
            Some(&index) => Err(Error::IndexOutOfRange { index, page_count }),
            None => Ok(()),
        }
    }

    /// Consumes the selection for one build.
    pub fn into_sequence(self) -> Vec<usize> {
        self.indices
    }
}

impl FromIterator<usize> for SelectionState {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        SelectionState {
            indices: iter.into_iter().collect(),
        }
    }
}

impl Extend<usize> for SelectionState {
    fn extend<I: IntoIterator<Item = usize>>(&mut self, iter: I) {
        self.indices.extend(iter);
    }
}
