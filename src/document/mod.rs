// Document model shared by the engine, the formatting logic and rendering

mod kind;
mod node;

pub use kind::*;
pub use node::*;
