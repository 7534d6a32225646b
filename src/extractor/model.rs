use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

pub const IMAGE_EXT_DEFAULT: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "svg"];
pub const VIDEO_EXT_DEFAULT: &[&str] = &["mp4", "webm", "mov", "m4v", "avi", "mkv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension lists used to classify candidate URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRules {
    image_exts: Vec<String>,
    video_exts: Vec<String>,
    image_default_ext: String,
    video_default_ext: String,
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self::new(
            IMAGE_EXT_DEFAULT.iter().copied(),
            VIDEO_EXT_DEFAULT.iter().copied(),
        )
    }
}

impl ExtractRules {
    /// Extensions are matched case-insensitively; a leading dot is ignored.
    pub fn new<I, V>(image_exts: I, video_exts: V) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        Self {
            image_exts: clean_exts(image_exts),
            video_exts: clean_exts(video_exts),
            image_default_ext: "jpg".to_string(),
            video_default_ext: "mp4".to_string(),
        }
    }

    pub fn extensions(&self, kind: MediaKind) -> &[String] {
        match kind {
            MediaKind::Image => &self.image_exts,
            MediaKind::Video => &self.video_exts,
        }
    }

    pub fn default_extension(&self, kind: MediaKind) -> &str {
        match kind {
            MediaKind::Image => &self.image_default_ext,
            MediaKind::Video => &self.video_default_ext,
        }
    }

    /// True when the lower-cased `path` ends with `.{ext}` for one of the
    /// kind's extensions.
    pub fn has_extension(&self, kind: MediaKind, path: &str) -> bool {
        self.extensions(kind).iter().any(|ext| {
            path.len() > ext.len()
                && path.ends_with(ext.as_str())
                && path.as_bytes()[path.len() - ext.len() - 1] == b'.'
        })
    }
}

fn clean_exts<I>(exts: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for ext in exts {
        let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

/// A media URL discovered on a page.
///
/// `url` and `kind` are fixed at creation. Size and content type are filled in
/// by the prober.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    url: Url,
    kind: MediaKind,
    filename: String,
    pub size_bytes: Option<u64>,
    pub content_type: String,
}

impl MediaItem {
    pub fn new(url: Url, kind: MediaKind, default_ext: &str) -> Self {
        let filename = derive_filename(&url, kind, default_ext);
        Self {
            url,
            kind,
            filename,
            size_bytes: None,
            content_type: String::new(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size in KB, or `None` when unknown.
    pub fn size_kb(&self) -> Option<f64> {
        self.size_bytes.map(|b| b as f64 / 1024.0)
    }
}

/// Last non-empty path segment, or `{kind}_{md5[..8]}.{ext}` when there is none.
pub fn derive_filename(url: &Url, kind: MediaKind, default_ext: &str) -> String {
    let last_segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back());

    match last_segment {
        Some(name) => name.to_string(),
        None => {
            let digest = format!("{:x}", md5::compute(url.as_str().as_bytes()));
            format!("{}_{}.{}", kind, &digest[..8], default_ext)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_last_path_segment() {
        let url = Url::parse("https://cdn.example.com/a/b/photo.JPG?w=200").unwrap();
        assert_eq!(derive_filename(&url, MediaKind::Image, "jpg"), "photo.JPG");

        let url = Url::parse("https://cdn.example.com/gallery/").unwrap();
        assert_eq!(derive_filename(&url, MediaKind::Image, "jpg"), "gallery");
    }

    #[test]
    fn filename_is_synthesized_for_bare_paths() {
        let url = Url::parse("https://cdn.example.com/").unwrap();
        let digest = format!("{:x}", md5::compute("https://cdn.example.com/"));

        let name = derive_filename(&url, MediaKind::Video, "mp4");
        assert_eq!(name, format!("video_{}.mp4", &digest[..8]));

        let name = derive_filename(&url, MediaKind::Image, "jpg");
        assert!(name.starts_with("image_"));
        assert!(name.ends_with(".jpg"));
        assert_eq!(name.len(), "image_".len() + 8 + ".jpg".len());
    }

    #[test]
    fn extension_match_requires_a_dot_boundary() {
        let rules = ExtractRules::default();
        assert!(rules.has_extension(MediaKind::Image, "/a/photo.jpg"));
        assert!(!rules.has_extension(MediaKind::Image, "/a/photojpg"));
        assert!(!rules.has_extension(MediaKind::Image, "/a/photo.jpgg"));
        assert!(rules.has_extension(MediaKind::Video, "/clip.webm"));
        assert!(!rules.has_extension(MediaKind::Video, "/clip.jpg"));
    }

    #[test]
    fn rules_normalize_extensions() {
        let rules = ExtractRules::new([".PNG", "png", " gif "], ["MP4"]);
        assert_eq!(rules.extensions(MediaKind::Image), ["png", "gif"]);
        assert_eq!(rules.extensions(MediaKind::Video), ["mp4"]);
    }
}
