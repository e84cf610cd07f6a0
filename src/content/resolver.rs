//! Content resolver - answers listing and single-document queries

use std::collections::HashSet;

use super::{ContentDocument, ContentStore};

/// Outcome of a single-document lookup.
///
/// `NotFound` is an ordinary result, not an error, and callers have to
/// decide what to show for it.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Found(&'a ContentDocument),
    NotFound,
}

impl<'a> Resolution<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }

    pub fn found(self) -> Option<&'a ContentDocument> {
        match self {
            Resolution::Found(document) => Some(document),
            Resolution::NotFound => None,
        }
    }
}

/// Predicate selecting documents whose path lies under `subdirectory`
pub fn in_collection(subdirectory: &str) -> impl Fn(&ContentDocument) -> bool + '_ {
    move |document| document.is_under(subdirectory)
}

/// Query interface over a [`ContentStore`]
#[derive(Debug, Clone, Copy)]
pub struct ContentResolver<'a> {
    store: &'a ContentStore,
}

impl<'a> ContentResolver<'a> {
    pub fn new(store: &'a ContentStore) -> Self {
        Self { store }
    }

    /// All documents matching `predicate`, in store order
    pub fn list_by<P>(&self, predicate: P) -> Vec<&'a ContentDocument>
    where
        P: Fn(&ContentDocument) -> bool,
    {
        self.store.iter().filter(|d| predicate(d)).collect()
    }

    /// Exact, case-sensitive slug lookup under `subdirectory`.
    ///
    /// When several documents share the slug the first one in store order
    /// wins; see [`ContentResolver::duplicate_slugs`].
    pub fn find_by_slug(&self, subdirectory: &str, slug: &str) -> Resolution<'a> {
        self.store
            .iter()
            .find(|d| d.slug() == slug && d.is_under(subdirectory))
            .map_or(Resolution::NotFound, Resolution::Found)
    }

    /// Previous and next documents around `slug` within `subdirectory`
    pub fn neighbours(
        &self,
        subdirectory: &str,
        slug: &str,
    ) -> (Option<&'a ContentDocument>, Option<&'a ContentDocument>) {
        let siblings = self.list_by(in_collection(subdirectory));
        let Some(pos) = siblings.iter().position(|d| d.slug() == slug) else {
            return (None, None);
        };

        let prev = pos.checked_sub(1).map(|i| siblings[i]);
        let next = siblings.get(pos + 1).copied();
        (prev, next)
    }

    /// `(collection, slug)` pairs held by more than one document
    pub fn duplicate_slugs(&self) -> Vec<(String, String)> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();

        for document in self.store.iter() {
            let key = (document.collection(), document.slug());
            if !seen.insert(key) && reported.insert(key) {
                duplicates.push((key.0.to_string(), key.1.to_string()));
            }
        }

        duplicates
    }
}
