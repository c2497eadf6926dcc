mod linter;

pub use linter::Linter;
