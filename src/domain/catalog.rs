/// Image catalog: the session's ordered list of images plus a wrapping cursor.
///
/// Order is the load order of the asset store and never changes during a
/// session. With zero images every navigation call is a no-op and
/// `current()` reports `CatalogError::Empty`.

use crate::error::CatalogError;

/// One guessable picture: unique name (the answer), a single-letter category
/// tag, and the encoded image bytes (PNG/JPEG) exactly as stored.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub name: String,
    pub category: String,
    pub data: Vec<u8>,
}

impl ImageAsset {
    /// Categories whose pictures carry meaningful transparency.
    pub fn has_alpha(&self) -> bool {
        self.category == "c" || self.category == "b"
    }
}

impl std::fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAsset")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    images: Vec<ImageAsset>,
    cursor: usize,
}

impl Catalog {
    pub fn new(images: Vec<ImageAsset>) -> Self {
        Catalog { images, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 1-based position for display ("image 3 of 12").
    pub fn position(&self) -> usize {
        if self.is_empty() { 0 } else { self.cursor + 1 }
    }

    #[allow(dead_code)]
    pub fn iter(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter()
    }

    pub fn current(&self) -> Result<&ImageAsset, CatalogError> {
        self.images.get(self.cursor).ok_or(CatalogError::Empty)
    }

    pub fn advance(&mut self) {
        let len = self.images.len();
        if len == 0 { return; }
        self.cursor = (self.cursor + 1) % len;
    }

    pub fn retreat(&mut self) {
        let len = self.images.len();
        if len == 0 { return; }
        self.cursor = (self.cursor + len - 1) % len;
    }
}
