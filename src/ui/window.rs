// Reader window: one page at a time inside a scrolled view, wrap-around
// page navigation, and pinch zoom that keeps the gesture's focal point
// stationary on screen.

use gtk4::gdk::Key;
use gtk4::gio::SimpleAction;
use gtk4::prelude::*;
use gtk4::{
    gio, Application, ApplicationWindow, Box as GtkBox, Button, EventControllerKey, FileDialog,
    GestureZoom, HeaderBar, Label, Orientation, ScrolledWindow, Stack, StackTransitionType,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::display::PageDisplay;
use crate::loader::ImageLoader;
use crate::models::{wrap_index, ViewerState};

const DEFAULT_WIDTH: i32 = 900;
const DEFAULT_HEIGHT: i32 = 1000;
const DEFAULT_TITLE: &str = "Comic Reader";
/// Keyboard zoom step in percentage points.
const KEY_ZOOM_STEP: f64 = 1.0;

type OpenFolderCallback = Rc<dyn Fn(gio::File)>;

pub struct ReaderWindow {
    self_weak: RefCell<Weak<ReaderWindow>>,
    window: ApplicationWindow,
    stack: Stack,
    scrolled: ScrolledWindow,
    display: PageDisplay,
    title_label: Label,
    subtitle_label: Label,
    close_comic_action: SimpleAction,
    loader: RefCell<Option<Box<dyn ImageLoader>>>,
    page_index: Cell<usize>,
    state: RefCell<ViewerState>,
    on_open_folder: RefCell<Option<OpenFolderCallback>>,
}

impl ReaderWindow {
    pub fn new(app: &Application) -> Rc<Self> {
        let window = ApplicationWindow::builder()
            .application(app)
            .title(DEFAULT_TITLE)
            .default_width(DEFAULT_WIDTH)
            .default_height(DEFAULT_HEIGHT)
            .build();

        // Header bar with a two-line title: page name over "Page i of n".
        let title_label = Label::new(Some(DEFAULT_TITLE));
        title_label.add_css_class("title");
        title_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);

        let subtitle_label = Label::new(None);
        subtitle_label.add_css_class("subtitle");
        subtitle_label.set_visible(false);

        let title_box = GtkBox::new(Orientation::Vertical, 0);
        title_box.set_valign(gtk4::Align::Center);
        title_box.append(&title_label);
        title_box.append(&subtitle_label);

        let prev_button = Button::from_icon_name("go-previous-symbolic");
        prev_button.set_tooltip_text(Some("Previous page"));
        let next_button = Button::from_icon_name("go-next-symbolic");
        next_button.set_tooltip_text(Some("Next page"));
        let open_button = Button::from_icon_name("folder-open-symbolic");
        open_button.set_tooltip_text(Some("Open comic folder"));

        let header = HeaderBar::new();
        header.set_title_widget(Some(&title_box));
        header.pack_start(&prev_button);
        header.pack_start(&next_button);
        header.pack_end(&open_button);
        window.set_titlebar(Some(&header));

        // The page lives inside a scrolled view; zooming resizes the page
        // widget and the scrolled window supplies the panning.
        let display = PageDisplay::new();
        let scrolled = ScrolledWindow::new();
        scrolled.set_hexpand(true);
        scrolled.set_vexpand(true);
        scrolled.set_child(Some(display.widget()));

        let empty_label = Label::new(Some("Open a folder to start reading"));
        empty_label.add_css_class("dim-label");

        let stack = Stack::new();
        stack.add_named(&empty_label, Some("empty"));
        stack.add_named(&scrolled, Some("comic_view"));
        stack.set_visible_child_name("empty");
        window.set_child(Some(&stack));

        let open_directory_action = SimpleAction::new("open-directory", None);
        let close_comic_action = SimpleAction::new("close-comic", None);
        close_comic_action.set_enabled(false);
        let next_page_action = SimpleAction::new("comic-next-page", None);
        let prev_page_action = SimpleAction::new("comic-prev-page", None);
        window.add_action(&open_directory_action);
        window.add_action(&close_comic_action);
        window.add_action(&next_page_action);
        window.add_action(&prev_page_action);

        let reader = Rc::new(Self {
            self_weak: RefCell::new(Weak::new()),
            window,
            stack,
            scrolled,
            display,
            title_label,
            subtitle_label,
            close_comic_action: close_comic_action.clone(),
            loader: RefCell::new(None),
            page_index: Cell::new(0),
            state: RefCell::new(ViewerState::new()),
            on_open_folder: RefCell::new(None),
        });
        *reader.self_weak.borrow_mut() = Rc::downgrade(&reader);

        let reader_weak = Rc::downgrade(&reader);
        next_button.connect_clicked(move |_| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.navigate(1);
            }
        });

        let reader_weak = Rc::downgrade(&reader);
        prev_button.connect_clicked(move |_| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.navigate(-1);
            }
        });

        let reader_weak = Rc::downgrade(&reader);
        open_button.connect_clicked(move |_| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.pick_folder();
            }
        });

        let reader_weak = Rc::downgrade(&reader);
        open_directory_action.connect_activate(move |_, _| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.pick_folder();
            }
        });

        let reader_weak = Rc::downgrade(&reader);
        close_comic_action.connect_activate(move |_, _| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.close_comic();
            }
        });

        let reader_weak = Rc::downgrade(&reader);
        next_page_action.connect_activate(move |_, _| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.navigate(1);
            }
        });

        let reader_weak = Rc::downgrade(&reader);
        prev_page_action.connect_activate(move |_, _| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.navigate(-1);
            }
        });

        reader.setup_keyboard();
        reader.setup_zoom_gesture();
        reader
    }

    /// Set up `-`/`=` zoom keys on the window.
    fn setup_keyboard(self: &Rc<Self>) {
        let key_controller = EventControllerKey::new();
        let reader_weak = Rc::downgrade(self);
        key_controller.connect_key_released(move |_, key, _code, _state| {
            let Some(reader) = reader_weak.upgrade() else {
                return;
            };
            // The keyboard path is inert while a pinch gesture is active.
            if reader.state.borrow().gesture_active() {
                return;
            }
            match key {
                Key::minus | Key::KP_Subtract => reader.adjust_zoom(-KEY_ZOOM_STEP),
                Key::equal | Key::KP_Add => reader.adjust_zoom(KEY_ZOOM_STEP),
                _ => {}
            }
        });
        self.window.add_controller(key_controller);
    }

    /// Set up the pinch gesture on the scrolled view.
    fn setup_zoom_gesture(self: &Rc<Self>) {
        let zoom_gesture = GestureZoom::new();

        let reader_weak = Rc::downgrade(self);
        zoom_gesture.connect_begin(move |gesture, _sequence| {
            let Some(reader) = reader_weak.upgrade() else {
                return;
            };
            let Some((cx, cy)) = gesture.bounding_box_center() else {
                return;
            };
            let offsets = (
                reader.scrolled.hadjustment().value(),
                reader.scrolled.vadjustment().value(),
            );
            reader.state.borrow_mut().begin_gesture((cx, cy), offsets);
        });

        let reader_weak = Rc::downgrade(self);
        zoom_gesture.connect_scale_changed(move |_gesture, factor| {
            let Some(reader) = reader_weak.upgrade() else {
                return;
            };
            let applied = reader.state.borrow_mut().apply_gesture_scale(factor);
            if let Some((offset_x, offset_y)) = applied {
                // Resizing first, then moving the adjustments, keeps the
                // gesture's focal point visually stationary.
                reader.apply_zoom();
                reader.scrolled.hadjustment().set_value(offset_x);
                reader.scrolled.vadjustment().set_value(offset_y);
            }
        });

        let reader_weak = Rc::downgrade(self);
        zoom_gesture.connect_end(move |_gesture, _sequence| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.state.borrow_mut().end_gesture();
            }
        });

        let reader_weak = Rc::downgrade(self);
        zoom_gesture.connect_cancel(move |_gesture, _sequence| {
            if let Some(reader) = reader_weak.upgrade() {
                reader.state.borrow_mut().cancel_gesture();
                reader.apply_zoom();
            }
        });

        self.scrolled.add_controller(zoom_gesture);
    }

    /// Registers the handler invoked with the folder chosen in the picker.
    pub fn connect_open_folder(&self, callback: impl Fn(gio::File) + 'static) {
        *self.on_open_folder.borrow_mut() = Some(Rc::new(callback));
    }

    /// Shows the native folder chooser. Cancellation leaves any open comic
    /// untouched.
    pub fn pick_folder(self: &Rc<Self>) {
        let dialog = FileDialog::builder().title("Select comic folder").build();
        let reader_weak = Rc::downgrade(self);
        dialog.select_folder(
            Some(&self.window),
            gio::Cancellable::NONE,
            move |result| {
                let Some(reader) = reader_weak.upgrade() else {
                    return;
                };
                match result {
                    Ok(folder) => {
                        let callback = reader.on_open_folder.borrow().clone();
                        if let Some(callback) = callback {
                            callback(folder);
                        }
                    }
                    Err(err) => {
                        tracing::debug!(error = %err, "folder selection dismissed");
                    }
                }
            },
        );
    }

    /// Replaces the page list and shows its first page.
    pub fn set_image_loader(&self, loader: Box<dyn ImageLoader>) {
        assert!(loader.num_pages() > 0, "page list must not be empty");
        *self.loader.borrow_mut() = Some(loader);

        self.state.borrow_mut().reset_zoom();
        self.apply_zoom();
        self.display_page(0);

        self.stack
            .set_visible_child_full("comic_view", StackTransitionType::SlideLeft);
        self.close_comic_action.set_enabled(true);
    }

    fn close_comic(&self) {
        *self.loader.borrow_mut() = None;
        self.display.set_page(None);
        self.page_index.set(0);
        self.title_label.set_text(DEFAULT_TITLE);
        self.subtitle_label.set_text("");
        self.subtitle_label.set_visible(false);
        self.window.set_title(Some(DEFAULT_TITLE));
        self.stack
            .set_visible_child_full("empty", StackTransitionType::SlideRight);
        self.close_comic_action.set_enabled(false);
    }

    fn navigate(&self, delta: isize) {
        let len = match self.loader.borrow().as_ref() {
            Some(loader) => loader.num_pages(),
            None => return,
        };
        self.display_page(wrap_index(self.page_index.get(), delta, len));
    }

    fn display_page(&self, index: usize) {
        let loader_ref = self.loader.borrow();
        let Some(loader) = loader_ref.as_ref() else {
            return;
        };
        let len = loader.num_pages();
        let index = index % len;

        let page = match loader.page(index) {
            Ok(page) => page,
            Err(err) => {
                // An unreadable or undecodable page is fatal; there is no
                // skip-and-continue fallback.
                tracing::error!(index, error = %err, "failed to load page");
                std::process::exit(1);
            }
        };

        self.page_index.set(index);
        self.title_label.set_text(&page.name);
        self.window.set_title(Some(&page.name));
        self.subtitle_label.set_text(&Self::page_subtitle(index, len));
        self.subtitle_label.set_visible(true);
        self.display.set_page(Some(page));
    }

    fn adjust_zoom(&self, delta: f64) {
        self.state.borrow_mut().adjust_zoom(delta);
        self.apply_zoom();
    }

    fn apply_zoom(&self) {
        self.display.set_scale(self.state.borrow().scale_factor());
    }

    fn page_subtitle(index: usize, len: usize) -> String {
        format!("Page {} of {}", index + 1, len)
    }

    pub fn present(&self) {
        self.window.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtitle_counts_pages_from_one() {
        assert_eq!(ReaderWindow::page_subtitle(0, 4), "Page 1 of 4");
        assert_eq!(ReaderWindow::page_subtitle(3, 4), "Page 4 of 4");
        assert_eq!(ReaderWindow::page_subtitle(0, 1), "Page 1 of 1");
    }

    #[test]
    fn key_zoom_step_is_one_percentage_point() {
        let mut state = ViewerState::new();
        state.adjust_zoom(-KEY_ZOOM_STEP);
        assert!((state.zoom() - 99.0).abs() < 1e-9);
        state.adjust_zoom(KEY_ZOOM_STEP);
        assert!((state.zoom() - 100.0).abs() < 1e-9);
    }
}
