//! Paged, selectable view over a camera listing.
//!
//! Kept free of any GUI types so both front-ends share the paging and
//! selection rules.

use std::collections::HashSet;

use crate::camera::RemoteImage;

pub struct Gallery {
    images: Vec<RemoteImage>,
    rows: usize,
    cols: usize,
    page: usize,
    selected: HashSet<String>,
}

impl Gallery {
    pub fn new(images: Vec<RemoteImage>, rows: usize, cols: usize) -> Self {
        Self {
            images,
            rows: rows.max(1),
            cols: cols.max(1),
            page: 0,
            selected: HashSet::new(),
        }
    }

    pub fn images(&self) -> &[RemoteImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn page_size(&self) -> usize {
        self.rows * self.cols
    }

    /// At least one page, even when empty.
    pub fn page_count(&self) -> usize {
        self.images.len().div_ceil(self.page_size()).max(1)
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    fn last_page(&self) -> usize {
        self.page_count() - 1
    }

    /// Jump to a page, clamped to the listing.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.min(self.last_page());
    }

    pub fn forward(&mut self, count: usize) {
        if self.images.is_empty() {
            return;
        }
        self.set_page(self.page.saturating_add(count));
    }

    pub fn backward(&mut self, count: usize) {
        if self.images.is_empty() {
            return;
        }
        self.page = self.page.saturating_sub(count);
    }

    /// Images on the current page, in display order.
    pub fn page_items(&self) -> &[RemoteImage] {
        let start = (self.page * self.page_size()).min(self.images.len());
        let end = (start + self.page_size()).min(self.images.len());
        &self.images[start..end]
    }

    pub fn is_selected(&self, path: &str) -> bool {
        self.selected.contains(path)
    }

    /// Only paths present in the listing can be selected.
    pub fn select(&mut self, path: &str) {
        if self.images.iter().any(|i| i.path == path) {
            self.selected.insert(path.to_string());
        }
    }

    pub fn unselect(&mut self, path: &str) {
        self.selected.remove(path);
    }

    pub fn toggle(&mut self, path: &str) {
        if self.is_selected(path) {
            self.unselect(path);
        } else {
            self.select(path);
        }
    }

    pub fn select_page(&mut self) {
        let paths: Vec<String> = self.page_items().iter().map(|i| i.path.clone()).collect();
        self.selected.extend(paths);
    }

    pub fn unselect_page(&mut self) {
        let paths: Vec<String> = self.page_items().iter().map(|i| i.path.clone()).collect();
        for path in paths {
            self.selected.remove(&path);
        }
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    /// Selected images in listing order.
    pub fn selected_images(&self) -> Vec<RemoteImage> {
        self.images
            .iter()
            .filter(|i| self.selected.contains(&i.path))
            .cloned()
            .collect()
    }

    /// A finished download leaves the selection.
    pub fn mark_downloaded(&mut self, path: &str) {
        self.selected.remove(path);
    }

    pub fn selection_label(&self) -> String {
        format!("Sel. {}/{}", self.selected.len(), self.images.len())
    }

    pub fn page_label(&self) -> String {
        format!("Page {}/{}", self.page + 1, self.page_count())
    }
}

pub fn progress_label(index: usize, total: usize) -> String {
    format!("File {index}/{total}")
}
