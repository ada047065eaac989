//! Source Map v3 generation from a [`PositionMap`].
//!
//! Columns are counted in UTF-16 code units, as browsers and bundlers
//! expect. A mapping is emitted at the start of every segment and at the
//! start of every generated line.

use crate::edit::{PositionMap, SegmentKind};
use serde::{Deserialize, Serialize};

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<String>>,
    pub names: Vec<String>,
    pub mappings: String,
}

/// One decoded mapping, all fields absolute and 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: usize,
    pub generated_column: usize,
    pub source: usize,
    pub original_line: usize,
    pub original_column: usize,
}

impl SourceMap {
    /// Build a map for `generated`, produced from `original` as described by
    /// `map`. `source` names the original file in `sources`.
    pub fn generate(
        map: &PositionMap,
        original: &str,
        generated: &str,
        source: &str,
        include_content: bool,
    ) -> Self {
        let original_lines = LineIndex::new(original);
        let generated_lines = LineIndex::new(generated);
        let mut mappings = Vec::new();
        let mut add = |generated_offset: usize, original_offset: usize| {
            let (generated_line, generated_column) = generated_lines.position(generated_offset);
            let (original_line, original_column) = original_lines.position(original_offset);
            mappings.push(Mapping {
                generated_line,
                generated_column,
                source: 0,
                original_line,
                original_column,
            });
        };

        for segment in map.segments() {
            if segment.generated.is_empty() {
                continue;
            }
            add(segment.generated.start, segment.original.start);

            let text = &generated[segment.generated.clone()];
            for (index, _) in text.match_indices('\n') {
                let next_line = index + 1;
                if next_line >= text.len() {
                    continue;
                }
                let original_offset = match segment.kind {
                    SegmentKind::Unchanged => segment.original.start + next_line,
                    SegmentKind::Replaced => segment.original.start,
                };
                add(segment.generated.start + next_line, original_offset);
            }
        }

        Self {
            version: 3,
            file: None,
            sources: vec![source.to_string()],
            sources_content: include_content.then(|| vec![original.to_string()]),
            names: Vec::new(),
            mappings: encode_mappings(&mappings, generated_lines.line_count()),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the `mappings` field. Returns `None` on malformed input.
    pub fn decode_mappings(&self) -> Option<Vec<Mapping>> {
        decode_mappings(&self.mappings)
    }
}

struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        Self { text, line_starts }
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 0-based line and UTF-16 column of a byte offset.
    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|start| *start <= offset) - 1;
        let start = self.line_starts[line];
        let column = self.text[start..offset].encode_utf16().count();
        (line, column)
    }
}

fn encode_mappings(mappings: &[Mapping], line_count: usize) -> String {
    let mut out = String::new();
    let mut previous_source = 0i64;
    let mut previous_line = 0i64;
    let mut previous_column = 0i64;
    let mut iter = mappings.iter().peekable();

    for line in 0..line_count {
        if line > 0 {
            out.push(';');
        }
        let mut previous_generated_column = 0i64;
        let mut first = true;

        while let Some(mapping) = iter.next_if(|mapping| mapping.generated_line == line) {
            if !first {
                out.push(',');
            }
            first = false;

            let generated_column = mapping.generated_column as i64;
            let source = mapping.source as i64;
            let original_line = mapping.original_line as i64;
            let original_column = mapping.original_column as i64;

            encode_vlq(&mut out, generated_column - previous_generated_column);
            encode_vlq(&mut out, source - previous_source);
            encode_vlq(&mut out, original_line - previous_line);
            encode_vlq(&mut out, original_column - previous_column);

            previous_generated_column = generated_column;
            previous_source = source;
            previous_line = original_line;
            previous_column = original_column;
        }
    }

    out
}

fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        ((-value as u64) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (vlq & 0b11111) as u8;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn decode_mappings(encoded: &str) -> Option<Vec<Mapping>> {
    let mut mappings = Vec::new();
    let mut source = 0i64;
    let mut original_line = 0i64;
    let mut original_column = 0i64;

    for (generated_line, line) in encoded.split(';').enumerate() {
        let mut generated_column = 0i64;
        for segment in line.split(',').filter(|segment| !segment.is_empty()) {
            let fields = decode_vlq_segment(segment)?;
            if fields.len() != 4 {
                return None;
            }
            generated_column += fields[0];
            source += fields[1];
            original_line += fields[2];
            original_column += fields[3];
            mappings.push(Mapping {
                generated_line,
                generated_column: usize::try_from(generated_column).ok()?,
                source: usize::try_from(source).ok()?,
                original_line: usize::try_from(original_line).ok()?,
                original_column: usize::try_from(original_column).ok()?,
            });
        }
    }

    Some(mappings)
}

fn decode_vlq_segment(segment: &str) -> Option<Vec<i64>> {
    let mut values = Vec::new();
    let mut value = 0u64;
    let mut shift = 0u32;

    for byte in segment.bytes() {
        let digit = BASE64.iter().position(|b| *b == byte)? as u64;
        value |= (digit & 0b11111) << shift;
        if digit & 0b100000 != 0 {
            shift += 5;
            if shift > 60 {
                return None;
            }
            continue;
        }
        let magnitude = (value >> 1) as i64;
        values.push(if value & 1 == 1 { -magnitude } else { magnitude });
        value = 0;
        shift = 0;
    }

    (shift == 0).then_some(values)
}
