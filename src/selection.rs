//! Choosing which discovered items to download.
//!
//! Sizes are compared in KB, matching how they are shown to the user. An item
//! of unknown size counts as -1 KB, so any size range leaves it out and a
//! descending sort puts it last.

use std::collections::HashSet;
use std::str::FromStr;

use crate::extractor::{MediaItem, MediaKind};

const UNKNOWN_KB: f64 = -1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Keep discovery order.
    #[default]
    Discovery,
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "discovery" => Ok(Self::Discovery),
            "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(format!("unknown sort order '{other}' (expected asc or desc)")),
        }
    }
}

/// Inclusive size range in KB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRangeKb {
    pub min: f64,
    pub max: f64,
}

impl SizeRangeKb {
    pub fn contains(&self, kb: f64) -> bool {
        kb >= self.min && kb <= self.max
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    kinds: Option<HashSet<MediaKind>>,
    size_range: Option<SizeRangeKb>,
    sort: SortOrder,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = MediaKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// A missing bound leaves that side open.
    pub fn with_size_range(mut self, min_kb: Option<f64>, max_kb: Option<f64>) -> Self {
        if min_kb.is_some() || max_kb.is_some() {
            self.size_range = Some(SizeRangeKb {
                min: min_kb.unwrap_or(0.0),
                max: max_kb.unwrap_or(f64::INFINITY),
            });
        }
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, item: &MediaItem) -> bool {
        if let Some(kinds) = &self.kinds
            && !kinds.contains(&item.kind())
        {
            return false;
        }
        match self.size_range {
            Some(range) => range.contains(size_kb(item)),
            None => true,
        }
    }

    /// Matching items in the requested order.
    pub fn apply<'a>(&self, items: &'a [MediaItem]) -> Vec<&'a MediaItem> {
        let mut chosen: Vec<&MediaItem> = items.iter().filter(|i| self.matches(i)).collect();
        match self.sort {
            SortOrder::Discovery => {}
            SortOrder::Ascending => chosen.sort_by(|a, b| size_kb(a).total_cmp(&size_kb(b))),
            SortOrder::Descending => chosen.sort_by(|a, b| size_kb(b).total_cmp(&size_kb(a))),
        }
        chosen
    }
}

fn size_kb(item: &MediaItem) -> f64 {
    item.size_kb().unwrap_or(UNKNOWN_KB)
}

/// Smallest and largest known size in KB.
pub fn known_range_kb(items: &[MediaItem]) -> Option<SizeRangeKb> {
    items
        .iter()
        .filter_map(MediaItem::size_kb)
        .fold(None, |range, kb| match range {
            None => Some(SizeRangeKb { min: kb, max: kb }),
            Some(r) => Some(SizeRangeKb {
                min: r.min.min(kb),
                max: r.max.max(kb),
            }),
        })
}

/// Sum of known sizes; unknown sizes count as zero.
pub fn total_bytes<'a>(items: impl IntoIterator<Item = &'a MediaItem>) -> u64 {
    items.into_iter().filter_map(|i| i.size_bytes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn item(name: &str, kind: MediaKind, size: Option<u64>) -> MediaItem {
        let url = Url::parse("https://a.com/").unwrap().join(name).unwrap();
        let mut item = MediaItem::new(url, kind, "jpg");
        item.size_bytes = size;
        item
    }

    fn sample() -> Vec<MediaItem> {
        vec![
            item("small.jpg", MediaKind::Image, Some(10 * 1024)),
            item("unknown.jpg", MediaKind::Image, None),
            item("clip.mp4", MediaKind::Video, Some(5 * 1024 * 1024)),
            item("mid.png", MediaKind::Image, Some(300 * 1024)),
        ]
    }

    fn names(items: &[&MediaItem]) -> Vec<String> {
        items.iter().map(|i| i.filename().to_string()).collect()
    }

    #[test]
    fn no_filters_keeps_everything_in_order() {
        let items = sample();
        let chosen = Selection::new().apply(&items);
        assert_eq!(
            names(&chosen),
            vec!["small.jpg", "unknown.jpg", "clip.mp4", "mid.png"]
        );
    }

    #[test]
    fn size_range_excludes_unknown_sizes() {
        let items = sample();
        let chosen = Selection::new()
            .with_size_range(Some(0.0), Some(1024.0))
            .apply(&items);
        assert_eq!(names(&chosen), vec!["small.jpg", "mid.png"]);
    }

    #[test]
    fn kind_filter_and_descending_sort() {
        let items = sample();
        let chosen = Selection::new()
            .with_kinds([MediaKind::Image])
            .with_sort(SortOrder::Descending)
            .apply(&items);
        assert_eq!(names(&chosen), vec!["mid.png", "small.jpg", "unknown.jpg"]);
    }

    #[test]
    fn ascending_sort_puts_unknown_first() {
        let items = sample();
        let chosen = Selection::new().with_sort(SortOrder::Ascending).apply(&items);
        assert_eq!(
            names(&chosen),
            vec!["unknown.jpg", "small.jpg", "mid.png", "clip.mp4"]
        );
    }

    #[test]
    fn known_range_and_totals() {
        let items = sample();
        let range = known_range_kb(&items).unwrap();
        assert_eq!(range.min, 10.0);
        assert_eq!(range.max, 5.0 * 1024.0);
        assert_eq!(total_bytes(&items), 10 * 1024 + 5 * 1024 * 1024 + 300 * 1024);
        assert!(known_range_kb(&[item("x.jpg", MediaKind::Image, None)]).is_none());
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Descending));
        assert_eq!("asc".parse::<SortOrder>(), Ok(SortOrder::Ascending));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
