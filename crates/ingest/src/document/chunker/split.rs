//! Heading and block splitting passes.
//!
//! Both passes are line scans threading an explicit [`FenceState`] so that
//! heading detection and block boundaries ignore anything inside a fence.

use super::types::{Block, BlockKind, FenceState, Section};

/// A fence marker line: trimmed content starts with three backticks.
fn is_fence(line: &str) -> bool {
    line.trim().starts_with("```")
}

/// ATX heading: 1-6 `#` markers, whitespace, then non-space text.
fn is_atx_heading(trimmed: &str) -> bool {
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return false;
    }
    let rest = &trimmed[hashes..];
    match rest.chars().next() {
        Some(c) if c.is_whitespace() => !rest.trim_start().is_empty(),
        _ => false,
    }
}

/// Numbered outline heading: `1.2` through `1.2.3.4`, whitespace, text.
/// A bare `1.` or a version string with no trailing text does not count.
fn is_numbered_heading(trimmed: &str) -> bool {
    let bytes = trimmed.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == 0 {
        return false;
    }

    let mut groups = 0usize;
    while i < bytes.len() && bytes[i] == b'.' {
        let start = i + 1;
        let mut j = start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j == start {
            return false;
        }
        groups += 1;
        i = j;
    }
    if !(1..=3).contains(&groups) {
        return false;
    }

    let rest = &trimmed[i..];
    match rest.chars().next() {
        Some(c) if c.is_whitespace() => !rest.trim_start().is_empty(),
        _ => false,
    }
}

/// A line is a heading outside a fence when it matches the ATX or numbered
/// outline pattern and is not a list-item line.
pub(crate) fn is_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("+ ") {
        return false;
    }
    is_atx_heading(trimmed) || is_numbered_heading(trimmed)
}

/// Heading text with ATX markers stripped; other headings keep their text.
fn heading_title(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.starts_with('#') {
        trimmed.trim_start_matches('#').trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Split text into sections at heading lines, tracking fence state so a
/// `# comment` inside a code block never starts a section. Each detected
/// heading flushes the accumulated lines as one section (titled by the
/// heading that opened it) and starts a new section at the heading line.
pub(crate) fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_lines: Vec<&str> = Vec::new();
    let mut current_title: Option<String> = None;
    let mut fence = FenceState::Outside;

    for line in text.lines() {
        if is_fence(line) {
            fence = fence.toggle();
        }

        if fence == FenceState::Outside && is_heading(line) {
            if !current_lines.is_empty() {
                sections.push(Section {
                    title: current_title.take(),
                    text: current_lines.join("\n").trim().to_string(),
                });
                current_lines.clear();
            }
            current_title = Some(heading_title(line));
        }

        current_lines.push(line);
    }

    if !current_lines.is_empty() {
        sections.push(Section {
            title: current_title,
            text: current_lines.join("\n").trim().to_string(),
        });
    }

    sections.retain(|s| !s.text.is_empty());
    sections
}

/// Split one section's text into paragraph and fenced-code blocks.
///
/// A fresh fence state is used per section. Blank lines flush the pending
/// paragraph; a fence-open flushes it and opens a code block that absorbs
/// every line through the matching fence-close inclusive. An unterminated
/// fence at end of section still flushes as one code block.
pub(crate) fn split_blocks(text: &str) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut code: Vec<&str> = Vec::new();
    let mut fence = FenceState::Outside;

    fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
        if !paragraph.is_empty() {
            let text = paragraph.join("\n").trim().to_string();
            if !text.is_empty() {
                blocks.push(Block {
                    kind: BlockKind::Text,
                    text,
                });
            }
            paragraph.clear();
        }
    }

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            match fence {
                FenceState::Inside => {
                    code.push(line);
                    let text = code.join("\n").trim().to_string();
                    if !text.is_empty() {
                        blocks.push(Block {
                            kind: BlockKind::Code,
                            text,
                        });
                    }
                    code.clear();
                    fence = FenceState::Outside;
                }
                FenceState::Outside => {
                    flush_paragraph(&mut paragraph, &mut blocks);
                    fence = FenceState::Inside;
                    code.push(line);
                }
            }
            continue;
        }

        match fence {
            FenceState::Inside => code.push(line),
            FenceState::Outside => {
                if trimmed.is_empty() {
                    flush_paragraph(&mut paragraph, &mut blocks);
                } else {
                    paragraph.push(line);
                }
            }
        }
    }

    if fence == FenceState::Inside && !code.is_empty() {
        let text = code.join("\n").trim().to_string();
        if !text.is_empty() {
            blocks.push(Block {
                kind: BlockKind::Code,
                text,
            });
        }
    } else {
        flush_paragraph(&mut paragraph, &mut blocks);
    }

    blocks
}
