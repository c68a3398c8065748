use log::debug;

use super::types::{Highlight, HighlightColor};

/// The host's highlight collection.
///
/// Only the host mutates it; embedded surfaces receive read-only copies
/// through the highlight channel.
#[derive(Debug, Default, Clone)]
pub struct HighlightStore {
    highlights: Vec<Highlight>,
}

impl HighlightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a highlight, replacing any existing one with the same id
    pub fn insert(&mut self, highlight: Highlight) {
        match self.highlights.iter_mut().find(|h| h.id == highlight.id) {
            Some(existing) => *existing = highlight,
            None => self.highlights.push(highlight),
        }
    }

    /// Remove a highlight by id. Returns the removed highlight.
    pub fn remove(&mut self, id: &str) -> Option<Highlight> {
        let index = self.highlights.iter().position(|h| h.id == id)?;
        Some(self.highlights.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    pub fn set_color(&mut self, id: &str, color: HighlightColor) -> bool {
        match self.highlights.iter_mut().find(|h| h.id == id) {
            Some(h) => {
                h.color = Some(color);
                true
            }
            None => {
                debug!("No highlight {id} to recolor");
                false
            }
        }
    }

    /// Highlights belonging to one document, in insertion order
    pub fn for_document<'a>(&'a self, document_id: &'a str) -> impl Iterator<Item = &'a Highlight> {
        self.highlights
            .iter()
            .filter(move |h| h.document_id == document_id)
    }

    pub fn all(&self) -> &[Highlight] {
        &self.highlights
    }

    pub fn len(&self) -> usize {
        self.highlights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::DocRect;

    fn highlight(id: &str, doc: &str) -> Highlight {
        Highlight {
            id: id.into(),
            document_id: doc.into(),
            page_index: 0,
            rects: vec![DocRect::new(0.0, 0.0, 10.0, 10.0)],
            color: None,
        }
    }

    #[test]
    fn insert_replaces_same_id() {
        let mut store = HighlightStore::new();
        store.insert(highlight("a", "one.pdf"));
        let mut moved = highlight("a", "one.pdf");
        moved.page_index = 4;
        store.insert(moved);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().page_index, 4);
    }

    #[test]
    fn filters_by_document() {
        let mut store = HighlightStore::new();
        store.insert(highlight("a", "one.pdf"));
        store.insert(highlight("b", "two.html"));
        store.insert(highlight("c", "one.pdf"));
        let ids: Vec<_> = store.for_document("one.pdf").map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn remove_and_recolor() {
        let mut store = HighlightStore::new();
        store.insert(highlight("a", "one.pdf"));
        assert!(store.set_color("a", HighlightColor::Placed));
        assert_eq!(store.get("a").unwrap().color, Some(HighlightColor::Placed));
        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(!store.set_color("a", HighlightColor::Staged));
        assert!(store.is_empty());
    }
}
