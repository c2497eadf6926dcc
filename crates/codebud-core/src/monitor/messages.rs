use crate::context::CodeContext;

/// One-line ambient summary sent on every tick.
pub fn context_summary(context: &CodeContext) -> String {
    format!(
        "[CONTEXT] File: {} ({}), Line: {}/{}, Mode: {}, Typing: {}",
        context.file_name,
        context.language,
        context.cursor_line,
        context.total_lines,
        context.mode,
        context.is_typing
    )
}

/// User turn sent when the user pauses after typing.
pub fn review_message(context: &CodeContext) -> String {
    let recent = if context.recent_changes.is_empty() {
        "none".to_string()
    } else {
        context.recent_changes.join(", ")
    };

    format!(
        "[CODE_REVIEW] I just paused typing. Here's my current code around line {line}:\n\
         \n\
         ```{language}\n\
         {code}\n\
         ```\n\
         \n\
         Recent changes: {recent}\n\
         File: {file}\n\
         Mode: {mode}\n\
         \n\
         Please briefly review and respond. If it looks fine, just say \"looks good\" or similar. \
         If there's an issue, explain it concisely.",
        line = context.cursor_line,
        language = context.language,
        code = context.surrounding_code,
        file = context.file_name,
        mode = context.mode,
    )
}

/// How a review shows up in the transcript.
pub fn review_label(context: &CodeContext) -> String {
    format!("[Auto-review triggered at line {}]", context.cursor_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;

    fn context() -> CodeContext {
        CodeContext {
            mode: Mode::Navigator,
            file_name: "app.py".into(),
            language: "python".into(),
            file_content: "x = 1\ny = 2".into(),
            surrounding_code: "x = 1\ny = 2".into(),
            cursor_line: 2,
            total_lines: 2,
            selected_text: None,
            recent_changes: vec![],
            is_typing: false,
            last_change_time: 0,
            seconds_since_last_change: 6,
            changes_since_last_poll: vec![],
            has_new_changes: false,
            diagnostics_summary: None,
        }
    }

    #[test]
    fn test_context_summary_format() {
        assert_eq!(
            context_summary(&context()),
            "[CONTEXT] File: app.py (python), Line: 2/2, Mode: navigator, Typing: false"
        );
    }

    #[test]
    fn test_review_message_embeds_code_and_changes() {
        let mut ctx = context();
        let message = review_message(&ctx);
        assert!(message.starts_with("[CODE_REVIEW] I just paused typing. Here's my current code around line 2:\n\n```python\nx = 1\ny = 2\n```\n"));
        assert!(message.contains("Recent changes: none\nFile: app.py\nMode: navigator\n\nPlease briefly review"));

        ctx.recent_changes = vec!["x = 1".into(), "y = 2".into()];
        assert!(review_message(&ctx).contains("Recent changes: x = 1, y = 2\n"));
    }
}
