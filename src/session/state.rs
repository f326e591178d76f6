//! Per-page overlay collections
//!
//! Every collection is an `Arc<Vec<_>>` replaced copy-on-write, so anyone
//! holding an earlier `Arc` keeps an unchanging view of it and can detect a
//! change with `Arc::ptr_eq`.

use std::sync::Arc;

use crate::domain::{
    DrawingPath, ImageObject, ImagePatch, ObjectId, ObjectKind, RedactionObject, TextObject,
    TextPatch,
};

use super::history::{PathHistory, PathList};

/// Everything editable on one page
#[derive(Clone, Debug, Default)]
pub struct PageOverlay {
    pub paths: PathList,
    pub texts: Arc<Vec<TextObject>>,
    pub images: Arc<Vec<ImageObject>>,
    pub redactions: Arc<Vec<RedactionObject>>,
    pub history: PathHistory,
}

/// Read-only copy of a page's overlay lists taken at one instant
#[derive(Clone, Debug)]
pub struct PageSnapshot {
    pub page_index: usize,
    pub paths: PathList,
    pub texts: Arc<Vec<TextObject>>,
    pub images: Arc<Vec<ImageObject>>,
    pub redactions: Arc<Vec<RedactionObject>>,
}

impl PageOverlay {
    /// Whether any of the four collections holds an object
    pub fn has_content(&self) -> bool {
        !self.paths.is_empty()
            || !self.texts.is_empty()
            || !self.images.is_empty()
            || !self.redactions.is_empty()
    }

    pub fn snapshot(&self, page_index: usize) -> PageSnapshot {
        PageSnapshot {
            page_index,
            paths: Arc::clone(&self.paths),
            texts: Arc::clone(&self.texts),
            images: Arc::clone(&self.images),
            redactions: Arc::clone(&self.redactions),
        }
    }

    pub fn text(&self, id: ObjectId) -> Option<&TextObject> {
        self.texts.iter().find(|t| t.id == id)
    }

    pub fn image(&self, id: ObjectId) -> Option<&ImageObject> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn is_locked(&self, id: ObjectId, kind: ObjectKind) -> Option<bool> {
        match kind {
            ObjectKind::Text => self.text(id).map(|t| t.locked),
            ObjectKind::Image => self.image(id).map(|i| i.locked),
        }
    }

    pub fn commit_stroke(&mut self, path: DrawingPath) {
        self.history.commit(&mut self.paths, path);
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.paths)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.paths)
    }

    pub fn add_text(&mut self, obj: TextObject) {
        Arc::make_mut(&mut self.texts).push(obj);
    }

    pub fn add_image(&mut self, obj: ImageObject) {
        Arc::make_mut(&mut self.images).push(obj);
    }

    pub fn add_redaction(&mut self, redaction: RedactionObject) {
        Arc::make_mut(&mut self.redactions).push(redaction);
    }

    pub fn update_text(&mut self, id: ObjectId, patch: &TextPatch) -> bool {
        let Some(index) = self.texts.iter().position(|t| t.id == id) else {
            return false;
        };
        patch.apply(&mut Arc::make_mut(&mut self.texts)[index]);
        true
    }

    pub fn update_image(&mut self, id: ObjectId, patch: &ImagePatch) -> bool {
        let Some(index) = self.images.iter().position(|i| i.id == id) else {
            return false;
        };
        patch.apply(&mut Arc::make_mut(&mut self.images)[index]);
        true
    }

    /// Apply `f` to every text object, replacing the list only if `f`
    /// reported a change for at least one of them
    pub fn update_texts_where(&mut self, mut f: impl FnMut(&mut TextObject) -> bool) -> usize {
        let mut updated = self.texts.as_ref().clone();
        let changed = updated.iter_mut().map(|t| f(t)).filter(|c| *c).count();
        if changed > 0 {
            self.texts = Arc::new(updated);
        }
        changed
    }

    /// Remove an unlocked object. Returns false if it is missing or locked.
    pub fn remove(&mut self, id: ObjectId, kind: ObjectKind) -> bool {
        if self.is_locked(id, kind) != Some(false) {
            return false;
        }
        match kind {
            ObjectKind::Text => Arc::make_mut(&mut self.texts).retain(|t| t.id != id),
            ObjectKind::Image => Arc::make_mut(&mut self.images).retain(|i| i.id != id),
        }
        true
    }

    pub fn reorder_to_front(&mut self, id: ObjectId, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Text => move_to_end(&mut self.texts, |t| t.id == id),
            ObjectKind::Image => move_to_end(&mut self.images, |i| i.id == id),
        }
    }

    pub fn reorder_to_back(&mut self, id: ObjectId, kind: ObjectKind) -> bool {
        match kind {
            ObjectKind::Text => move_to_start(&mut self.texts, |t| t.id == id),
            ObjectKind::Image => move_to_start(&mut self.images, |i| i.id == id),
        }
    }

    /// Drop every overlay and the stroke history
    pub fn clear(&mut self) {
        *self = PageOverlay::default();
    }
}

fn move_to_end<T: Clone>(list: &mut Arc<Vec<T>>, pred: impl Fn(&T) -> bool) -> bool {
    let Some(index) = list.iter().position(pred) else {
        return false;
    };
    let items = Arc::make_mut(list);
    let item = items.remove(index);
    items.push(item);
    true
}

fn move_to_start<T: Clone>(list: &mut Arc<Vec<T>>, pred: impl Fn(&T) -> bool) -> bool {
    let Some(index) = list.iter().position(pred) else {
        return false;
    };
    let items = Arc::make_mut(list);
    let item = items.remove(index);
    items.insert(0, item);
    true
}

/// Arena of per-page overlay records, indexed by zero-based page number
#[derive(Clone, Debug, Default)]
pub struct OverlayStore {
    pages: Vec<PageOverlay>,
}

impl OverlayStore {
    pub fn new(page_count: usize) -> Self {
        Self {
            pages: vec![PageOverlay::default(); page_count],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&PageOverlay> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut PageOverlay> {
        self.pages.get_mut(index)
    }

    /// Indices of pages with at least one overlay, ascending
    pub fn changed_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.has_content())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn snapshot(&self, index: usize) -> Option<PageSnapshot> {
        self.page(index).map(|page| page.snapshot(index))
    }
}
