// Presentation mapping from document nodes to visuals: HTML for export and
// egui formats for the desktop view.

mod html;
mod style;

pub use html::*;
pub use style::*;
