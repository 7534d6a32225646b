pub mod document;
pub mod model;
pub mod normalize;
pub mod registry;

#[cfg(test)]
mod tests;

pub use document::{MediaDocument, Tag};
pub use model::{ExtractRules, IMAGE_EXT_DEFAULT, MediaItem, MediaKind, VIDEO_EXT_DEFAULT};
pub use normalize::normalize_url;
pub use registry::DiscoverySet;

use tracing::debug;
use url::Url;

/// Collect image and video URLs referenced by `html`.
///
/// Visits every `img` (src, then srcset), every `video` (src, then nested
/// `source` elements), then every `a`. The first classification of a URL
/// wins.
pub fn extract_media(base: &Url, html: &str, rules: &ExtractRules) -> DiscoverySet {
    let document = MediaDocument::parse(html);
    let mut found = DiscoverySet::new();

    let mut add = |reference: Option<&str>, kind: MediaKind| {
        if let Some(url) = normalize_url(base, reference) {
            add_tagged(&mut found, url, kind, rules);
        }
    };

    for img in document.find_all(Tag::Img) {
        add(img.src(), MediaKind::Image);
        for candidate in img.srcset() {
            add(Some(candidate), MediaKind::Image);
        }
    }

    for video in document.find_all(Tag::Video) {
        add(video.src(), MediaKind::Video);
        for source in video.sources() {
            add(source.src(), MediaKind::Video);
        }
    }

    for anchor in document.find_all(Tag::Anchor) {
        let Some(url) = normalize_url(base, anchor.href()) else {
            continue;
        };
        let path = url.path().to_lowercase();
        for kind in [MediaKind::Image, MediaKind::Video] {
            if rules.has_extension(kind, &path) {
                add_tagged(&mut found, url.clone(), kind, rules);
            }
        }
    }

    debug!(base = %base, items = found.len(), "media extraction complete");
    found
}

/// Media-tag rule: a recognized extension for `kind`, or no dot in the path.
fn accepts(rules: &ExtractRules, kind: MediaKind, path: &str) -> bool {
    !path.contains('.') || rules.has_extension(kind, path)
}

fn add_tagged(found: &mut DiscoverySet, url: Url, kind: MediaKind, rules: &ExtractRules) {
    if found.contains(&url) {
        return;
    }
    let path = url.path().to_lowercase();
    if accepts(rules, kind, &path) {
        found.insert(url, kind, rules.default_extension(kind));
    }
}
