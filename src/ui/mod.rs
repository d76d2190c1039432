pub mod display;
pub mod window;

pub use window::ReaderWindow;
