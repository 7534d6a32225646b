use url::Url;

/// Resolve `reference` against `base` into a canonical absolute URL.
///
/// Fragments are dropped. Returns `None` for absent or blank references,
/// unparseable input, and anything that is not http(s).
pub fn normalize_url(base: &Url, reference: Option<&str>) -> Option<Url> {
    let reference = reference?.trim();
    if reference.is_empty() {
        return None;
    }

    let mut url = base.join(reference).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}
