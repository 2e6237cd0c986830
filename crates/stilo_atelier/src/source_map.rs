//! Source-map emission for rewritten files.
//!
//! Every edit shifts the text that follows it, so the rewriter records the
//! boundaries of the unchanged regions while applying edits and emits a
//! standard v3 map: one segment at the start of each unchanged region and
//! at each line start, columns in UTF-16 code units, VLQ-encoded.

use serde::Serialize;

use crate::edit::Edit;

/// A v3 source map for one rewritten file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Serialise to the JSON form bundlers exchange.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Build the map for `source` rewritten by `edits` (sorted ascending).
pub fn build_source_map(file: &str, source: &str, edits: &[Edit]) -> SourceMap {
    let mut builder = MappingsBuilder::new();
    let mut pos = 0usize;

    for edit in edits {
        builder.advance_unchanged(&source[pos..edit.start as usize]);
        builder.advance_inserted(&edit.text);
        builder.advance_removed(&source[edit.start as usize..edit.end as usize]);
        pos = edit.end as usize;
    }
    builder.advance_unchanged(&source[pos..]);

    SourceMap {
        version: 3,
        file: file.to_string(),
        sources: vec![file.to_string()],
        sources_content: vec![source.to_string()],
        names: Vec::new(),
        mappings: builder.finish(),
    }
}

/// One decoded mapping: output column to original line/column, single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Segment {
    out_col: u32,
    orig_line: u32,
    orig_col: u32,
}

struct MappingsBuilder {
    lines: Vec<Vec<Segment>>,
    out_col: u32,
    orig_line: u32,
    orig_col: u32,
}

impl MappingsBuilder {
    fn new() -> Self {
        Self {
            lines: vec![Vec::new()],
            out_col: 0,
            orig_line: 0,
            orig_col: 0,
        }
    }

    fn anchor(&mut self) {
        let segment = Segment {
            out_col: self.out_col,
            orig_line: self.orig_line,
            orig_col: self.orig_col,
        };
        if let Some(line) = self.lines.last_mut() {
            line.push(segment);
        }
    }

    /// Text present in both the original and the output.
    fn advance_unchanged(&mut self, text: &str) {
        let mut need_anchor = true;
        for ch in text.chars() {
            if need_anchor {
                self.anchor();
                need_anchor = false;
            }
            if ch == '\n' {
                self.lines.push(Vec::new());
                self.out_col = 0;
                self.orig_line += 1;
                self.orig_col = 0;
                need_anchor = true;
            } else {
                let width = ch.len_utf16() as u32;
                self.out_col += width;
                self.orig_col += width;
            }
        }
    }

    /// Replacement text: advances the output only.
    fn advance_inserted(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.lines.push(Vec::new());
                self.out_col = 0;
            } else {
                self.out_col += ch.len_utf16() as u32;
            }
        }
    }

    /// Replaced original text: advances the original only.
    fn advance_removed(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.orig_line += 1;
                self.orig_col = 0;
            } else {
                self.orig_col += ch.len_utf16() as u32;
            }
        }
    }

    fn finish(self) -> String {
        let mut mappings = String::new();
        let mut prev_orig_line = 0i64;
        let mut prev_orig_col = 0i64;

        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                mappings.push(';');
            }
            let mut prev_out_col = 0i64;
            for (j, segment) in line.iter().enumerate() {
                if j > 0 {
                    mappings.push(',');
                }
                encode_vlq(i64::from(segment.out_col) - prev_out_col, &mut mappings);
                // Source index delta: always the single source
                encode_vlq(0, &mut mappings);
                encode_vlq(i64::from(segment.orig_line) - prev_orig_line, &mut mappings);
                encode_vlq(i64::from(segment.orig_col) - prev_orig_col, &mut mappings);
                prev_out_col = i64::from(segment.out_col);
                prev_orig_line = i64::from(segment.orig_line);
                prev_orig_col = i64::from(segment.orig_col);
            }
        }
        mappings
    }
}

const BASE64_CHARS: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn encode_vlq(value: i64, out: &mut String) {
    let mut vlq: u64 = if value < 0 {
        (((-value) as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };
    loop {
        let mut digit = (vlq & 0b1_1111) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b10_0000;
        }
        out.push(BASE64_CHARS[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}
