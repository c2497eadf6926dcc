use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Zero-indexed line / character position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// Text and start line of one content change, as the change tracker sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub text: String,
    /// 1-indexed.
    pub line: usize,
}

pub struct TextDocument {
    uri: String,
    language_id: String,
    text: Rope,
    version: u64,
}

impl TextDocument {
    pub fn new(uri: impl Into<String>, text: &str) -> Self {
        let uri = uri.into();
        let language_id = language_id_for(&uri).to_string();
        Self {
            uri,
            language_id,
            text: Rope::from_str(text),
            version: 0,
        }
    }

    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = language_id.into();
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Last path component of the URI.
    pub fn file_name(&self) -> &str {
        self.uri
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.uri)
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Editor line count: a trailing line break opens one more (empty) line.
    pub fn line_count(&self) -> usize {
        self.text.len_lines()
    }

    pub fn ends_with_newline(&self) -> bool {
        let len = self.text.len_chars();
        len > 0 && matches!(self.text.char(len - 1), '\n' | '\r')
    }

    /// Line break used by the document, taken from its first break.
    /// Documents without one default to `\n`.
    pub fn eol(&self) -> &'static str {
        let mut chars = self.text.chars();
        while let Some(c) = chars.next() {
            match c {
                '\n' => return "\n",
                '\r' if chars.next() == Some('\n') => return "\r\n",
                '\r' => return "\r",
                _ => {}
            }
        }
        "\n"
    }

    /// Text of line `line` without its line break.
    pub fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.line_count() {
            return None;
        }
        let text = self.text.line(line).to_string();
        Some(text.trim_end_matches(['\n', '\r']).to_string())
    }

    /// Lines `start..=end` joined with `\n`, without a trailing line break.
    pub fn lines_text(&self, start: usize, end: usize) -> String {
        let end = end.min(self.line_count().saturating_sub(1));
        (start..=end)
            .filter_map(|line| self.line_text(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Character index of the end of `line`, before its line break.
    pub fn line_end(&self, line: usize) -> Position {
        let len = self
            .line_text(line)
            .map(|text| text.chars().count())
            .unwrap_or(0);
        Position::new(line, len)
    }

    pub fn text_in(&self, start: Position, end: Position) -> String {
        let from = self.char_index(start);
        let to = self.char_index(end).max(from);
        self.text.slice(from..to).to_string()
    }

    fn char_index(&self, pos: Position) -> usize {
        if pos.line >= self.line_count() {
            return self.text.len_chars();
        }
        let line_start = self.text.line_to_char(pos.line);
        let line_len = self.line_end(pos.line).character;
        line_start + pos.character.min(line_len)
    }

    /// Replace `start..end` with `new_text`. Positions past the end of the
    /// document clamp to the end.
    pub fn replace(&mut self, start: Position, end: Position, new_text: &str) -> ContentChange {
        let from = self.char_index(start);
        let to = self.char_index(end).max(from);
        if to > from {
            self.text.remove(from..to);
        }
        self.text.insert(from, new_text);
        self.version += 1;
        ContentChange {
            text: new_text.to_string(),
            line: start.line.min(self.line_count().saturating_sub(1)) + 1,
        }
    }

    pub fn insert(&mut self, at: Position, new_text: &str) -> ContentChange {
        self.replace(at, at, new_text)
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = Rope::from_str(text);
        self.version += 1;
    }
}

/// Splits `text` after every `\n`, `\r\n` or lone `\r`, keeping the break
/// on each piece. Numbers lines exactly like [`TextDocument`].
pub fn split_lines_inclusive(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let end = match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => Some(i + 2),
            b'\r' | b'\n' => Some(i + 1),
            _ => None,
        };
        match end {
            Some(end) => {
                lines.push(&text[start..end]);
                start = end;
                i = end;
            }
            None => i += 1,
        }
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

pub fn strip_line_break(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix(['\n', '\r']))
        .unwrap_or(line)
}

/// Language identifier derived from the file extension.
pub fn language_id_for(uri: &str) -> &'static str {
    let ext = Path::new(uri)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "ts" => "typescript",
        "tsx" => "typescriptreact",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "rb" => "ruby",
        "md" => "markdown",
        "json" => "json",
        "toml" => "toml",
        "html" => "html",
        "css" => "css",
        "sh" => "shellscript",
        _ => "plaintext",
    }
}
