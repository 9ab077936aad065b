use crate::annotation::{Annotation, AnnotationId};

/// Ordered annotation records for one open document.
///
/// Insertion order is the listing order; it has no effect on rendering or
/// export because every record carries its own page.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    records: Vec<Annotation>,
    selected: Option<AnnotationId>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, annotation: Annotation) {
        log::debug!(
            "annotation {} ({}) added on page {}",
            annotation.id(),
            annotation.kind().label(),
            annotation.page()
        );
        self.records.push(annotation);
    }

    /// Replaces the record with the same id. Unknown ids are ignored, since a
    /// drag update can arrive after its draft was already discarded.
    pub fn update(&mut self, annotation: &Annotation) {
        let Some(existing) = self.records.iter_mut().find(|record| record.id() == annotation.id())
        else {
            return;
        };

        if existing.page() != annotation.page() {
            log::debug!(
                "ignoring update that would move annotation {} to another page",
                annotation.id()
            );
            return;
        }

        *existing = annotation.clone();
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.records.iter().position(|record| record.id() == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.records.remove(index))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.get(id).is_some()
    }

    /// Records on `page` in store order. The iterator is lazy and can be cloned
    /// to walk the same page again.
    pub fn list_by_page(&self, page: u32) -> impl Iterator<Item = &Annotation> + Clone + '_ {
        self.records.iter().filter(move |record| record.page() == page)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> + Clone + '_ {
        self.records.iter()
    }

    /// Distinct pages that carry at least one record, ascending.
    pub fn pages(&self) -> Vec<u32> {
        let mut pages: Vec<u32> = self.records.iter().map(Annotation::page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }

    pub fn select(&mut self, id: Option<AnnotationId>) {
        self.selected = id;
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
