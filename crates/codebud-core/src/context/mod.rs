mod assembler;
mod history;

pub use assembler::{get_context, truncate_content, CodeContext};
pub use history::ConversationHistory;
