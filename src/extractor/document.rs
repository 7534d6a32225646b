use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// The tags media extraction looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Img,
    Video,
    Source,
    Anchor,
}

static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static VIDEO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("video").unwrap());
static SOURCE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("source").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

impl Tag {
    fn selector(self) -> &'static Selector {
        match self {
            Self::Img => &IMG,
            Self::Video => &VIDEO,
            Self::Source => &SOURCE,
            Self::Anchor => &ANCHOR,
        }
    }
}

/// Parsed HTML with typed access to media-bearing elements.
pub struct MediaDocument {
    html: Html,
}

impl MediaDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All elements of `tag`, in document order.
    pub fn find_all(&self, tag: Tag) -> impl Iterator<Item = MediaElement<'_>> {
        self.html
            .select(tag.selector())
            .map(|element| MediaElement { element })
    }
}

#[derive(Clone, Copy)]
pub struct MediaElement<'a> {
    element: ElementRef<'a>,
}

impl<'a> MediaElement<'a> {
    pub fn src(&self) -> Option<&'a str> {
        self.element.value().attr("src")
    }

    pub fn href(&self) -> Option<&'a str> {
        self.element.value().attr("href")
    }

    /// URL of each `srcset` candidate, in listed order; descriptors dropped.
    pub fn srcset(&self) -> Vec<&'a str> {
        self.element
            .value()
            .attr("srcset")
            .map(|srcset| {
                srcset
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .filter_map(|entry| entry.split_whitespace().next())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `<source>` elements nested under this one, in document order.
    pub fn sources(&self) -> impl Iterator<Item = MediaElement<'a>> + use<'a> {
        self.element
            .select(Tag::Source.selector())
            .map(|element| MediaElement { element })
    }
}
