use gtk4::prelude::*;
use gtk4::{gio, Application};
use std::rc::Rc;
use std::sync::Arc;

use crate::loader::{BackgroundImageLoader, DirectoryImageLoader, ImageLoader};
use crate::ui::ReaderWindow;

const APP_ID: &str = "com.comicreader.ComicReader";

pub struct ReaderApp {
    app: Application,
}

impl ReaderApp {
    pub fn new() -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::HANDLES_OPEN | gio::ApplicationFlags::NON_UNIQUE)
            .build();

        app.connect_startup(Self::on_startup);
        app.connect_activate(Self::on_activate);
        app.connect_open(Self::on_open);

        app.set_accels_for_action("app.quit", &["<primary>q"]);
        app.set_accels_for_action("win.open-directory", &["<primary>o"]);
        app.set_accels_for_action("win.close-comic", &["<primary>w"]);
        app.set_accels_for_action("win.comic-next-page", &["Right", "Page_Down"]);
        app.set_accels_for_action("win.comic-prev-page", &["Left", "Page_Up"]);

        Self { app }
    }

    pub fn run(&self) -> i32 {
        self.app.run().into()
    }

    fn on_startup(app: &Application) {
        let quit_action = gio::SimpleAction::new("quit", None);
        let app_weak = app.downgrade();
        quit_action.connect_activate(move |_, _| {
            if let Some(app) = app_weak.upgrade() {
                app.quit();
            }
        });
        app.add_action(&quit_action);
    }

    fn on_activate(app: &Application) {
        let window = Self::ensure_window(app);
        window.present();
        window.pick_folder();
    }

    fn on_open(app: &Application, files: &[gio::File], _hint: &str) {
        // Opening several targets at once is a contract violation.
        assert!(
            files.len() == 1,
            "expected exactly one folder to open, got {}",
            files.len()
        );

        let window = Self::ensure_window(app);
        Self::open_folder(&window, &files[0]);
        window.present();
    }

    fn ensure_window(app: &Application) -> Rc<ReaderWindow> {
        // Keep the window alive by storing it on the Application.
        if let Some(existing) = unsafe { app.data::<Rc<ReaderWindow>>("reader-window") } {
            return unsafe { existing.as_ref() }.clone();
        }

        let window = ReaderWindow::new(app);
        let window_weak = Rc::downgrade(&window);
        window.connect_open_folder(move |folder| {
            if let Some(window) = window_weak.upgrade() {
                Self::open_folder(&window, &folder);
            }
        });
        unsafe {
            app.set_data("reader-window", window.clone());
        }
        window
    }

    /// Enumerates the folder and hands the sorted page list to the window.
    /// Enumeration failure is fatal; there is no partial-listing recovery.
    fn open_folder(window: &Rc<ReaderWindow>, folder: &gio::File) {
        let Some(path) = folder.path() else {
            tracing::error!(uri = %folder.uri(), "open target has no local path");
            std::process::exit(1);
        };

        match DirectoryImageLoader::new(&path) {
            Ok(loader) => {
                tracing::info!(
                    folder = %path.display(),
                    pages = loader.num_pages(),
                    "opened comic folder"
                );
                let loader = BackgroundImageLoader::new(Arc::new(loader));
                window.set_image_loader(Box::new(loader));
            }
            Err(err) => {
                tracing::error!(folder = %path.display(), error = ?err, "failed to open folder");
                std::process::exit(1);
            }
        }
    }
}

impl Default for ReaderApp {
    fn default() -> Self {
        Self::new()
    }
}
