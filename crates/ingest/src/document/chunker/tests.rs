//! Tests for the chunking engine.

use super::split::{is_heading, split_blocks, split_sections};
use super::types::BlockKind;
use super::{chunk_documents, chunk_text};
use crate::document::{DocumentMeta, SourceDocument};

fn fence_count(text: &str) -> usize {
    text.lines().filter(|l| l.trim().starts_with("```")).count()
}

fn make_doc(text: &str) -> SourceDocument {
    SourceDocument {
        text: text.to_string(),
        meta: DocumentMeta {
            file_name: Some("test.md".to_string()),
            file_path: Some("kb/test.md".to_string()),
            page: None,
        },
    }
}

// ── Heading detection ───────────────────────────────────────────────

#[test]
fn atx_headings_detected() {
    assert!(is_heading("# Title"));
    assert!(is_heading("###### Deep"));
    assert!(is_heading("  ## Indented"));
    assert!(!is_heading("####### Too deep"));
    assert!(!is_heading("#NoSpace"));
    assert!(!is_heading("##   "));
}

#[test]
fn numbered_headings_detected() {
    assert!(is_heading("1.2 Consensus"));
    assert!(is_heading("3.1.4 Gas costs"));
    assert!(!is_heading("1. Plain enumeration"));
    assert!(!is_heading("1.2.3.4.5 Too deep"));
    assert!(!is_heading("1.2.3"));
}

#[test]
fn list_items_are_not_headings() {
    assert!(!is_heading("- # not a heading"));
    assert!(!is_heading("* item"));
    assert!(!is_heading("+ 1.2 item"));
}

// ── Section split ───────────────────────────────────────────────────

#[test]
fn sections_split_at_headings_and_keep_heading_line() {
    let text = "Preamble text.\n\n## First\nAlpha.\n\n## Second\nBravo.";
    let sections = split_sections(text);
    assert_eq!(sections.len(), 3);
    assert_eq!(sections[0].title, None);
    assert_eq!(sections[0].text, "Preamble text.");
    assert_eq!(sections[1].title.as_deref(), Some("First"));
    assert!(sections[1].text.starts_with("## First"));
    assert_eq!(sections[2].title.as_deref(), Some("Second"));
}

#[test]
fn heading_inside_fence_does_not_split() {
    let text = "## Code\n```bash\n# this is a comment\n## not a heading\n```\nAfter.";
    let sections = split_sections(text);
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title.as_deref(), Some("Code"));
}

#[test]
fn empty_text_yields_no_sections() {
    assert!(split_sections("").is_empty());
    assert!(split_sections("   \n\n  \n").is_empty());
}

// ── Block split ─────────────────────────────────────────────────────

#[test]
fn paragraphs_split_at_blank_lines() {
    let blocks = split_blocks("First paragraph.\n\nSecond paragraph.\nStill second.");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].kind, BlockKind::Text);
    assert_eq!(blocks[1].text, "Second paragraph.\nStill second.");
}

#[test]
fn fenced_code_is_one_block() {
    let blocks = split_blocks("Intro.\n```rust\nfn main() {}\n\nlet x = 1;\n```\nOutro.");
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1].kind, BlockKind::Code);
    // Blank lines inside the fence do not split the code block.
    assert!(blocks[1].text.contains("let x = 1;"));
    assert!(blocks[1].text.starts_with("```rust"));
    assert!(blocks[1].text.ends_with("```"));
}

#[test]
fn unterminated_fence_flushes_as_code() {
    let blocks = split_blocks("Text.\n```\ndangling code");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].kind, BlockKind::Code);
    assert!(blocks[1].text.contains("dangling code"));
}

#[test]
fn whitespace_only_blocks_are_dropped() {
    let blocks = split_blocks("\n\n   \n\nReal content.\n\n  \n");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text, "Real content.");
}

// ── Windowing ───────────────────────────────────────────────────────

#[test]
fn empty_document_produces_no_chunks() {
    assert!(chunk_text("", 512, 50).is_empty());
}

#[test]
fn small_document_is_one_chunk() {
    let chunks = chunk_text("Just one short paragraph.", 512, 50);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0], "Just one short paragraph.");
}

#[test]
fn chunks_respect_max_chars() {
    let paragraphs: Vec<String> = (0..20)
        .map(|i| format!("Paragraph number {i} with a bit of filler text in it."))
        .collect();
    let text = paragraphs.join("\n\n");
    let chunks = chunk_text(&text, 160, 0);
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(
            chunk.chars().count() <= 160,
            "chunk exceeds max_chars: {}",
            chunk.len()
        );
    }
}

#[test]
fn oversized_single_block_is_emitted_whole() {
    let big = "x".repeat(400);
    let text = format!("Small one.\n\n{big}\n\nSmall two.");
    let chunks = chunk_text(&text, 100, 0);
    assert!(chunks.iter().any(|c| c.contains(&big)), "oversized block must survive intact");
    // Only the oversized-block chunk may exceed the budget.
    for chunk in &chunks {
        if !chunk.contains(&big) {
            assert!(chunk.chars().count() <= 100);
        }
    }
}

#[test]
fn zero_overlap_reconstructs_block_sequence() {
    let text = "A first paragraph.\n\nA second paragraph.\n\n```\ncode\n```\n\nA third paragraph.";
    let blocks = split_blocks(text);
    let chunks = chunk_text(text, 60, 0);
    assert!(chunks.len() > 1);
    let rejoined = chunks.join("\n\n");
    let expected = blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    assert_eq!(rejoined, expected);
}

#[test]
fn overlap_is_suffix_of_previous_and_prefix_of_next() {
    let text = "Alpha bravo charlie.\n\nDelta echo foxtrot.\n\nGolf hotel india.\n\nJuliet kilo lima.";
    let chunks = chunk_text(&text, 50, 25);
    assert!(chunks.len() > 1);
    for pair in chunks.windows(2) {
        let prev_last = pair[0].rsplit("\n\n").next().unwrap();
        assert!(
            pair[1].starts_with(prev_last),
            "next chunk must start with the carried text block"
        );
        assert!(prev_last.chars().count() <= 25);
    }
}

#[test]
fn code_blocks_are_never_carried_as_overlap() {
    let text = "Lead paragraph here.\n\n```\nlet a = 1;\nlet b = 2;\n```\n\nTrailing paragraph content.";
    let chunks = chunk_text(&text, 50, 30);
    assert!(chunks.len() > 1);
    for chunk in &chunks[1..] {
        assert!(
            !chunk.starts_with("```") || fence_count(chunk) % 2 == 0,
            "carried overlap must not open with copied code"
        );
    }
    // The code block appears exactly once across all chunks.
    let occurrences: usize = chunks.iter().map(|c| c.matches("let a = 1;").count()).sum();
    assert_eq!(occurrences, 1);
}

#[test]
fn every_chunk_has_even_fence_count() {
    let text = "## Setup\nIntro.\n\n```bash\ncargo run\n```\n\nMiddle.\n\n```bash\ncargo test\ncargo bench\n```\n\nEnd.";
    for max in [40, 60, 100, 500] {
        for chunk in chunk_text(text, max, 10) {
            assert_eq!(
                fence_count(&chunk) % 2,
                0,
                "chunk splits a code fence at max={max}: {chunk:?}"
            );
        }
    }
}

// ── Document-collection variant ─────────────────────────────────────

#[test]
fn two_section_example_yields_titled_chunks() {
    let doc = make_doc("## A\nHello world.\n\n## B\n```\ncode here\n```\n");
    let records = chunk_documents(&[doc], 100, 10);
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].section_title.as_deref(), Some("A"));
    assert_eq!(fence_count(&records[0].text), 0);
    assert!(records[0].text.contains("Hello world."));

    assert_eq!(records[1].section_title.as_deref(), Some("B"));
    assert_eq!(fence_count(&records[1].text), 2);
    assert!(records[1].text.contains("code here"));
}

#[test]
fn chunk_indices_are_monotonic_per_document() {
    let doc_a = make_doc("## One\nAlpha.\n\n## Two\nBravo.\n\n## Three\nCharlie.");
    let doc_b = make_doc("Standalone paragraph.");
    let records = chunk_documents(&[doc_a, doc_b], 512, 0);
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].index, 0);
    assert_eq!(records[1].index, 1);
    assert_eq!(records[2].index, 2);
    // Index restarts for the next document.
    assert_eq!(records[3].index, 0);
}

#[test]
fn document_metadata_passes_through() {
    let doc = make_doc("## Title\nBody.");
    let records = chunk_documents(&[doc], 512, 0);
    assert_eq!(records[0].meta.file_name.as_deref(), Some("test.md"));
    assert_eq!(records[0].meta.file_path.as_deref(), Some("kb/test.md"));
    assert_eq!(records[0].meta.page, None);
}

#[test]
fn preamble_chunks_carry_no_section_title() {
    let doc = make_doc("Intro before any heading.\n\n## Later\nBody.");
    let records = chunk_documents(&[doc], 512, 0);
    assert_eq!(records[0].section_title, None);
    assert_eq!(records[1].section_title.as_deref(), Some("Later"));
}
