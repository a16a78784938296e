/// Resource classification for navigation targets
///
/// Only documents are fetched; images, media and fonts are refused before
/// any request leaves the process.
use url::Url;

/// The kind of resource a URL points at, judged from its path extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// HTML page or anything without a recognised static extension
    Document,

    /// Raster or vector image
    Image,

    /// Audio or video
    Media,

    /// Web font
    Font,
}

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp", "avif",
];
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "webm", "mp3", "ogg", "wav", "mov", "m4a"];
const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf", "eot"];

impl ResourceKind {
    /// Classifies a URL by the extension of its last path segment
    pub fn of(url: &Url) -> Self {
        let extension = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .and_then(|last| last.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => Self::Image,
            Some(ext) if MEDIA_EXTENSIONS.contains(&ext) => Self::Media,
            Some(ext) if FONT_EXTENSIONS.contains(&ext) => Self::Font,
            _ => Self::Document,
        }
    }

    /// Returns true for sub-resources that are never fetched
    pub fn is_blocked(&self) -> bool {
        !matches!(self, Self::Document)
    }
}
