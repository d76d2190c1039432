// Page loading for the comic reader.
// A loader turns a folder of files into an ordered page sequence; the
// background decorator keeps the neighboring pages decoded ahead of time.

pub mod background;
pub mod collate;
pub mod directory;

pub use background::BackgroundImageLoader;
pub use directory::DirectoryImageLoader;

use std::sync::Arc;

use thiserror::Error;

/// One decoded page: its display name plus RGBA8 pixels at the image's
/// natural resolution. Pixel data is plain bytes so pages can cross thread
/// boundaries; the GTK texture is created on the main thread at display time.
pub struct PageImage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("page index {index} out of range ({len} pages)")]
    OutOfRange { index: usize, len: usize },
    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

/// Source of pages for the viewer window.
///
/// Pages are identified by their position in the sorted sequence. `page`
/// returns a shared handle so caching loaders can hand out cheap duplicates.
pub trait ImageLoader {
    fn num_pages(&self) -> usize;

    fn page(&self, index: usize) -> Result<Arc<PageImage>, LoadError>;
}
