#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use mediasweep::ExtractRules;
use mediasweep::extractor::extract_media;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);
    let base = Url::parse("https://example.com/gallery/").unwrap();

    // Never panics; every discovered URL is absolute http(s) without a fragment.
    let found = extract_media(&base, &html, &ExtractRules::default());
    for item in found.items() {
        assert!(matches!(item.url().scheme(), "http" | "https"));
        assert!(item.url().fragment().is_none());
        assert!(!item.filename().is_empty());
    }
});
