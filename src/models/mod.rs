pub mod viewer_state;

pub use viewer_state::{wrap_index, ViewerState};
