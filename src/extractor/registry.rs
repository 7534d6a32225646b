use std::collections::HashSet;

use url::Url;

use crate::extractor::model::{MediaItem, MediaKind};

/// Unique media items in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct DiscoverySet {
    items: Vec<MediaItem>,
    seen: HashSet<Url>,
}

impl DiscoverySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.seen.contains(url)
    }

    /// Inserts unless `url` is already registered. Returns whether it was added.
    pub fn insert(&mut self, url: Url, kind: MediaKind, default_ext: &str) -> bool {
        if !self.seen.insert(url.clone()) {
            return false;
        }
        self.items.push(MediaItem::new(url, kind, default_ext));
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// Size/content-type enrichment only; items cannot be added or removed.
    pub fn items_mut(&mut self) -> &mut [MediaItem] {
        &mut self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaItem> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<MediaItem> {
        self.items
    }

    /// Sum of known sizes.
    pub fn known_bytes(&self) -> u64 {
        self.items.iter().filter_map(|i| i.size_bytes).sum()
    }
}

impl<'a> IntoIterator for &'a DiscoverySet {
    type Item = &'a MediaItem;
    type IntoIter = std::slice::Iter<'a, MediaItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
