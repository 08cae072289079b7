mod document;
mod editor;

pub use editor::*;
