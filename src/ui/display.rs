// Scaled page display for the reader window.

use gdk4::{MemoryFormat, MemoryTexture, Texture};
use gtk4::prelude::*;
use gtk4::Picture;
use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::loader::PageImage;

/// Renders one decoded page scaled by the viewer's zoom factor.
///
/// The picture widget is size-requested to `natural_size * scale` and
/// stretches its paintable to fill that allocation, so the scaled paint and
/// the scrolling stay with the toolkit.
pub struct PageDisplay {
    picture: Picture,
    page: RefCell<Option<Arc<PageImage>>>,
    scale: Cell<f64>,
}

impl PageDisplay {
    pub fn new() -> Self {
        let picture = Picture::new();
        picture.set_can_shrink(true);
        picture.set_content_fit(gtk4::ContentFit::Fill);
        picture.set_halign(gtk4::Align::Start);
        picture.set_valign(gtk4::Align::Start);

        Self {
            picture,
            page: RefCell::new(None),
            scale: Cell::new(1.0),
        }
    }

    pub fn widget(&self) -> &Picture {
        &self.picture
    }

    /// Replaces the displayed page; the previous texture is discarded.
    pub fn set_page(&self, page: Option<Arc<PageImage>>) {
        match &page {
            Some(page) => {
                let texture = Self::create_texture_from_rgba(&page.pixels, page.width, page.height);
                self.picture.set_paintable(texture.as_ref());
            }
            None => self.picture.set_paintable(Option::<&Texture>::None),
        }
        *self.page.borrow_mut() = page;
        self.update_size_request();
    }

    pub fn set_scale(&self, scale: f64) {
        self.scale.set(scale);
        self.update_size_request();
    }

    fn update_size_request(&self) {
        let (width, height) = match self.page.borrow().as_ref() {
            Some(page) => Self::scaled_size(page.width, page.height, self.scale.get()),
            None => (1, 1),
        };
        self.picture.set_size_request(width, height);
        self.picture.queue_draw();
    }

    fn scaled_size(width: u32, height: u32, scale: f64) -> (i32, i32) {
        (
            (width as f64 * scale).round() as i32,
            (height as f64 * scale).round() as i32,
        )
    }

    fn create_texture_from_rgba(data: &[u8], width: u32, height: u32) -> Option<Texture> {
        if width == 0 || height == 0 {
            return None;
        }
        let expected = (width as u64)
            .saturating_mul(height as u64)
            .saturating_mul(4);
        if (data.len() as u64) < expected {
            tracing::warn!(
                "Skipping texture: data too small ({} bytes for {}x{})",
                data.len(),
                width,
                height
            );
            return None;
        }
        let bytes = glib::Bytes::from(data);
        let texture = MemoryTexture::new(
            width as i32,
            height as i32,
            MemoryFormat::R8g8b8a8,
            &bytes,
            (width * 4) as usize,
        );
        Some(texture.upcast())
    }
}

impl Default for PageDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_request_scales_both_axes_uniformly() {
        assert_eq!(PageDisplay::scaled_size(800, 600, 1.0), (800, 600));
        assert_eq!(PageDisplay::scaled_size(800, 600, 0.5), (400, 300));
        assert_eq!(PageDisplay::scaled_size(800, 600, 2.0), (1600, 1200));
    }

    #[test]
    fn size_request_rounds_fractional_pixels() {
        assert_eq!(PageDisplay::scaled_size(3, 3, 0.5), (2, 2));
        assert_eq!(PageDisplay::scaled_size(100, 50, 0.01), (1, 1));
    }
}
