//! Document outline (table of contents)
//!
//! The outline is walked once and turned into an immutable [`Synopsis`]
//! tree. Each recursion level returns its own subtree, so the result is
//! assembled bottom-up.

use crate::backend::DocumentBackend;
use crate::destination::{resolve_viewport, Viewport};
use serde::Serialize;

/// One outline entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynopsisEntry {
    pub title: String,
    /// Navigation target, `None` when the entry's destination does not resolve
    pub viewport: Option<Viewport>,
    /// Expanded by default. Only root entries with a target are.
    pub open: bool,
    pub children: Vec<SynopsisEntry>,
}

impl SynopsisEntry {
    /// Number of entries in this subtree, including this one.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(SynopsisEntry::subtree_len).sum::<usize>()
    }
}

/// The document's outline tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Synopsis {
    pub entries: Vec<SynopsisEntry>,
}

impl Synopsis {
    /// Walk the whole outline of `doc`.
    pub fn build<D: DocumentBackend + ?Sized>(doc: &D) -> Self {
        Self {
            entries: children_of(doc, None),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of entries at every depth.
    pub fn len(&self) -> usize {
        self.entries.iter().map(SynopsisEntry::subtree_len).sum()
    }

    /// Depth-first iteration over every entry.
    pub fn iter(&self) -> impl Iterator<Item = &SynopsisEntry> {
        let mut stack: Vec<&SynopsisEntry> = self.entries.iter().rev().collect();
        std::iter::from_fn(move || {
            let entry = stack.pop()?;
            stack.extend(entry.children.iter().rev());
            Some(entry)
        })
    }
}

fn children_of<D: DocumentBackend + ?Sized>(doc: &D, parent: Option<&D::Bookmark>) -> Vec<SynopsisEntry> {
    let mut entries = Vec::new();
    let mut current = doc.first_child(parent);
    while let Some(bookmark) = current {
        let viewport = doc
            .bookmark_destination(&bookmark)
            .and_then(|dest| resolve_viewport(doc, &dest));
        entries.push(SynopsisEntry {
            title: doc.bookmark_title(&bookmark),
            open: parent.is_none() && viewport.is_some(),
            viewport,
            children: children_of(doc, Some(&bookmark)),
        });
        current = doc.next_sibling(&bookmark);
    }
    entries
}
