// Directory-backed page loader: one page per immediate child of a folder.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::collate::sort_filenames;
use super::{ImageLoader, LoadError, PageImage};

/// Loads pages from the immediate children of one folder, sorted by
/// locale-aware natural filename order. Enumeration happens once at
/// construction; page bytes are read and decoded on demand.
pub struct DirectoryImageLoader {
    directory: PathBuf,
    names: Vec<String>,
}

impl DirectoryImageLoader {
    pub fn new(directory: &Path) -> Result<Self> {
        let entries = fs::read_dir(directory)
            .with_context(|| format!("failed to enumerate {}", directory.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .with_context(|| format!("failed to enumerate {}", directory.display()))?;
            // Children are listed as-is: subfolders and non-image files stay
            // in the page list and only fail if the user navigates to them.
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        sort_filenames(&mut names);

        Ok(Self {
            directory: directory.to_path_buf(),
            names,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl ImageLoader for DirectoryImageLoader {
    fn num_pages(&self) -> usize {
        self.names.len()
    }

    fn page(&self, index: usize) -> Result<Arc<PageImage>, LoadError> {
        let name = self.names.get(index).ok_or(LoadError::OutOfRange {
            index,
            len: self.names.len(),
        })?;

        let bytes = fs::read(self.directory.join(name)).map_err(|source| LoadError::Read {
            name: name.clone(),
            source,
        })?;
        let decoded = image::load_from_memory(&bytes).map_err(|source| LoadError::Decode {
            name: name.clone(),
            source,
        })?;

        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Arc::new(PageImage {
            name: name.clone(),
            width,
            height,
            pixels: rgba.into_raw(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn create_test_image(path: &Path) {
        // Minimal valid PNG file (1x1 pixel)
        let png_data: [u8; 69] = [
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
            0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1 dimensions
            0x08, 0x02, 0x00, 0x00, 0x00, 0x90, 0x77, 0x53,
            0xDE, // bit depth, color type, etc
            0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, // IDAT chunk
            0x78, 0x9C, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, 0x03, 0x01, 0x01, 0x00, 0xC9, 0xFE,
            0x92, 0xEF, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, // IEND chunk
            0xAE, 0x42, 0x60, 0x82,
        ];

        let mut file = File::create(path).unwrap();
        file.write_all(&png_data).unwrap();
    }

    #[test]
    fn pages_cover_folder_children_in_natural_order() {
        let dir = tempdir().unwrap();
        for name in ["b.png", "a.jpg", "c10.png", "c2.png"] {
            create_test_image(&dir.path().join(name));
        }

        let loader = DirectoryImageLoader::new(dir.path()).unwrap();
        assert_eq!(loader.num_pages(), 4);
        assert_eq!(loader.names(), ["a.jpg", "b.png", "c2.png", "c10.png"]);
    }

    #[test]
    fn page_decodes_to_natural_dimensions() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("only.png"));

        let loader = DirectoryImageLoader::new(dir.path()).unwrap();
        let page = loader.page(0).unwrap();
        assert_eq!(page.name, "only.png");
        assert_eq!((page.width, page.height), (1, 1));
        assert_eq!(page.pixels.len(), 4);
    }

    #[test]
    fn repeated_loads_yield_identical_pages() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("only.png"));

        let loader = DirectoryImageLoader::new(dir.path()).unwrap();
        let first = loader.page(0).unwrap();
        let second = loader.page(0).unwrap();
        assert_eq!(first.name, second.name);
        assert_eq!((first.width, first.height), (second.width, second.height));
    }

    #[test]
    fn empty_folder_has_no_pages() {
        let dir = tempdir().unwrap();
        let loader = DirectoryImageLoader::new(dir.path()).unwrap();
        assert_eq!(loader.num_pages(), 0);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let dir = tempdir().unwrap();
        create_test_image(&dir.path().join("only.png"));

        let loader = DirectoryImageLoader::new(dir.path()).unwrap();
        assert!(matches!(
            loader.page(1),
            Err(LoadError::OutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn non_image_bytes_fail_to_decode() {
        let dir = tempdir().unwrap();
        let mut file = File::create(dir.path().join("notes.txt")).unwrap();
        file.write_all(b"not an image").unwrap();

        let loader = DirectoryImageLoader::new(dir.path()).unwrap();
        assert!(matches!(loader.page(0), Err(LoadError::Decode { .. })));
    }

    #[test]
    fn subfolders_are_listed_but_fail_to_load() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("chapter1")).unwrap();

        let loader = DirectoryImageLoader::new(dir.path()).unwrap();
        assert_eq!(loader.names(), ["chapter1"]);
        assert!(loader.page(0).is_err());
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(DirectoryImageLoader::new(&missing).is_err());
    }
}
