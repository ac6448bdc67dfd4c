pub mod editor;
mod toolbar;

pub use toolbar::{Toolbar, TOOLBAR_FORMATS};
