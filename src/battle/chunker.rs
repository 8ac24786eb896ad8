//! Greedy, order-preserving partition of rendered log lines into blocks that
//! fit a display-field size limit.

use serde::{Deserialize, Serialize};

/// Display-field limit of the chat platform, in characters.
pub const MAX_BLOCK_CHARS: usize = 1024;

pub const PRIMARY_TITLE: &str = "📜 Battle Log 📜";
pub const CONTINUATION_TITLE: &str = "📜 Battle Log (continued) 📜";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockLabel {
    Primary,
    /// 1-based position among the continuation blocks.
    Continuation { index: usize },
}

impl BlockLabel {
    fn for_position(position: usize) -> Self {
        match position {
            0 => Self::Primary,
            n => Self::Continuation { index: n },
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Primary => PRIMARY_TITLE,
            Self::Continuation { .. } => CONTINUATION_TITLE,
        }
    }
}

/// A run of whole lines, each terminated by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogBlock {
    pub label: BlockLabel,
    pub title: String,
    pub text: String,
    pub line_count: usize,
}

impl LogBlock {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

struct OpenBlock {
    text: String,
    chars: usize,
    lines: usize,
}

impl OpenBlock {
    fn new() -> Self {
        Self {
            text: String::new(),
            chars: 0,
            lines: 0,
        }
    }

    fn seal(self, position: usize) -> LogBlock {
        let label = BlockLabel::for_position(position);
        LogBlock {
            label,
            title: label.title().to_string(),
            text: self.text,
            line_count: self.lines,
        }
    }
}

/// Append each line (plus its newline) to the open block unless that would
/// push the block past `max_chars`; then seal the block and start a new one
/// with the line. Lines are never split, so a single line longer than the
/// limit becomes a block of its own. Empty blocks are never emitted.
pub fn chunk_lines<S: AsRef<str>>(lines: &[S], max_chars: usize) -> Vec<LogBlock> {
    let mut blocks = Vec::new();
    let mut open = OpenBlock::new();

    for line in lines {
        let line = line.as_ref();
        let line_chars = line.chars().count() + 1;
        if open.lines > 0 && open.chars + line_chars > max_chars {
            let sealed = std::mem::replace(&mut open, OpenBlock::new());
            blocks.push(sealed.seal(blocks.len()));
        }
        open.text.push_str(line);
        open.text.push('\n');
        open.chars += line_chars;
        open.lines += 1;
    }

    if open.lines > 0 {
        blocks.push(open.seal(blocks.len()));
    }
    blocks
}
