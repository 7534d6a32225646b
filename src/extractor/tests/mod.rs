use std::fs;
use url::Url;

use crate::extractor::{ExtractRules, MediaKind, extract_media};

fn base() -> Url {
    Url::parse("https://example.com/spring/gallery.html").unwrap()
}

fn urls_and_kinds(html: &str) -> Vec<(String, MediaKind)> {
    extract_media(&base(), html, &ExtractRules::default())
        .iter()
        .map(|item| (item.url().to_string(), item.kind()))
        .collect()
}

#[test]
fn test_extract_gallery_fixture() {
    let html = fs::read_to_string("src/extractor/tests/fixtures/gallery.html")
        .expect("Failed to read test fixture");

    let found = urls_and_kinds(&html);
    let expected = vec![
        ("https://example.com/static/logo.svg", MediaKind::Image),
        ("https://example.com/spring/photos/tulips.jpg", MediaKind::Image),
        ("https://example.com/spring/photos/tulips-480.jpg", MediaKind::Image),
        ("https://example.com/spring/photos/tulips-960.jpg", MediaKind::Image),
        ("https://example.com/api/thumbnail?id=42", MediaKind::Image),
        ("https://example.com/media/intro.mp4", MediaKind::Video),
        ("https://example.com/media/intro.webm", MediaKind::Video),
        ("https://cdn.example.net/raw/poppies.PNG", MediaKind::Image),
        ("https://example.com/media/trailer.mkv", MediaKind::Video),
    ];
    let expected: Vec<(String, MediaKind)> = expected
        .into_iter()
        .map(|(u, k)| (u.to_string(), k))
        .collect();

    assert_eq!(found, expected);
}

#[test]
fn test_same_canonical_url_is_kept_once_with_first_kind() {
    // Extension-less URL: the img classifies it first, the video is ignored.
    let html = r#"
        <img src="/stream/42">
        <video src="/stream/42#start"></video>
        <a href="https://example.com/stream/42">again</a>
    "#;

    let found = urls_and_kinds(html);
    assert_eq!(
        found,
        vec![("https://example.com/stream/42".to_string(), MediaKind::Image)]
    );
}

#[test]
fn test_extensionless_img_is_an_image() {
    let found = urls_and_kinds(r#"<img src="photo">"#);
    assert_eq!(
        found,
        vec![("https://example.com/spring/photo".to_string(), MediaKind::Image)]
    );
}

#[test]
fn test_pdf_anchor_is_neither_kind() {
    assert!(urls_and_kinds(r#"<a href="doc.pdf">doc</a>"#).is_empty());
}

#[test]
fn test_extensionless_anchor_contributes_nothing() {
    assert!(urls_and_kinds(r#"<a href="/gallery/next">next</a>"#).is_empty());
}

#[test]
fn test_misspelled_extension_is_excluded_everywhere() {
    let html = r#"<img src="/a/pic.JPGG"><a href="/a/pic.JPGG">x</a>"#;
    assert!(urls_and_kinds(html).is_empty());
}

#[test]
fn test_video_extension_under_img_is_rejected() {
    // A dotted path must match the tag's own kind.
    let found = urls_and_kinds(r#"<img src="clip.mp4"><video src="still.png"></video>"#);
    assert!(found.is_empty());
}

#[test]
fn test_custom_rules_limit_extensions() {
    let rules = ExtractRules::new(["png"], ["webm"]);
    let html = r#"
        <img src="a.jpg"><img src="b.png">
        <video src="c.mp4"></video><video src="d.webm"></video>
    "#;

    let found: Vec<String> = extract_media(&base(), html, &rules)
        .iter()
        .map(|i| i.filename().to_string())
        .collect();
    assert_eq!(found, vec!["b.png", "d.webm"]);
}

#[test]
fn test_synthesized_filename_for_root_url() {
    let set = extract_media(
        &base(),
        r#"<video src="https://media.example.com/"></video>"#,
        &ExtractRules::default(),
    );

    let item = &set.items()[0];
    assert_eq!(item.kind(), MediaKind::Video);
    assert!(item.filename().starts_with("video_"));
    assert!(item.filename().ends_with(".mp4"));
    assert_eq!(item.size_bytes, None);
    assert!(item.content_type.is_empty());
}

#[test]
fn test_malformed_html() {
    let html = "<html><body><img src=\"a.gif\"<div><video><source src=\"b.mov\">";
    let found = urls_and_kinds(html);
    assert!(found.iter().any(|(u, k)| u.ends_with("/b.mov") && *k == MediaKind::Video));
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let _ = extract_media(&base(), &html, &ExtractRules::default());
        }

        #[test]
        fn test_extracted_urls_are_unique(
            refs in proptest::collection::vec("[a-c]{1,2}(\\.jpg|\\.mp4)?", 0..12)
        ) {
            let html: String = refs
                .iter()
                .map(|r| format!("<img src=\"{r}\"><a href=\"{r}\">x</a>"))
                .collect();
            let set = extract_media(&base(), &html, &ExtractRules::default());
            let mut urls: Vec<_> = set.iter().map(|i| i.url().clone()).collect();
            let before = urls.len();
            urls.sort();
            urls.dedup();
            prop_assert_eq!(before, urls.len());
        }
    }
}
