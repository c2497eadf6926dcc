mod actions;
mod document;
mod host;

pub use actions::{EditResult, EditorActions};
pub use document::{
    language_id_for, split_lines_inclusive, strip_line_break, ContentChange, Position,
    TextDocument,
};
pub use host::{EditorHost, Highlight};
