use std::ops::Range;
use thiserror::Error;

/// The fundamental edit primitive: byte-span replacement against the
/// original source text.
///
/// Offsets always address the *original* text. Edits recorded in any order
/// are applied in one pass, so no edit ever has to account for the length
/// change introduced by another.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Edit does nothing until it is recorded in a Splicer"]
pub struct Edit {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// New text to insert at [byte_start, byte_end)
    pub new_text: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid byte range: [{byte_start}, {byte_end}) in source of length {source_len}")]
    InvalidByteRange {
        byte_start: usize,
        byte_end: usize,
        source_len: usize,
    },

    #[error("Cannot overwrite the empty range at byte {byte_start}")]
    EmptyRange { byte_start: usize },

    #[error("Edit [{byte_start}, {byte_end}) does not fall on UTF-8 character boundaries")]
    InvalidUtf8Edit { byte_start: usize, byte_end: usize },

    #[error("Edits overlap: [{first_start}, {first_end}) and [{second_start}, {second_end})")]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },
}

impl Edit {
    pub fn new(byte_start: usize, byte_end: usize, new_text: impl Into<String>) -> Self {
        Self {
            byte_start,
            byte_end,
            new_text: new_text.into(),
        }
    }

    /// Validate the edit against the source it will be applied to.
    ///
    /// Returns the text currently at [byte_start, byte_end).
    pub fn validate<'a>(&self, source: &'a str) -> Result<&'a str, EditError> {
        if self.byte_start > self.byte_end || self.byte_end > source.len() {
            return Err(EditError::InvalidByteRange {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
                source_len: source.len(),
            });
        }

        if self.byte_start == self.byte_end {
            return Err(EditError::EmptyRange {
                byte_start: self.byte_start,
            });
        }

        source
            .get(self.byte_start..self.byte_end)
            .ok_or(EditError::InvalidUtf8Edit {
                byte_start: self.byte_start,
                byte_end: self.byte_end,
            })
    }

    pub fn span(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }
}

/// Accumulates non-overlapping overwrites of one immutable source text.
#[derive(Debug, Clone)]
pub struct Splicer<'a> {
    source: &'a str,
    edits: Vec<Edit>,
}

/// Output of [`Splicer::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    pub code: String,
    pub map: PositionMap,
}

impl<'a> Splicer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Record an overwrite of [byte_start, byte_end) in the original text.
    ///
    /// The range itself is checked immediately; overlap with other edits is
    /// checked by [`Splicer::apply`].
    pub fn overwrite(
        &mut self,
        byte_start: usize,
        byte_end: usize,
        new_text: impl Into<String>,
    ) -> Result<(), EditError> {
        let edit = Edit::new(byte_start, byte_end, new_text);
        edit.validate(self.source)?;
        self.edits.push(edit);
        Ok(())
    }

    /// Recorded edits, in the order they were recorded.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply every recorded edit to the original text in a single pass.
    ///
    /// Fails if any two edits overlap; the result does not depend on the
    /// order edits were recorded in.
    pub fn apply(&self) -> Result<Spliced, EditError> {
        let mut ordered: Vec<&Edit> = self.edits.iter().collect();
        ordered.sort_by_key(|edit| (edit.byte_start, edit.byte_end));

        for edit in &ordered {
            edit.validate(self.source)?;
        }

        for window in ordered.windows(2) {
            let (earlier, later) = (window[0], window[1]);
            if earlier.byte_end > later.byte_start {
                return Err(EditError::Overlap {
                    first_start: earlier.byte_start,
                    first_end: earlier.byte_end,
                    second_start: later.byte_start,
                    second_end: later.byte_end,
                });
            }
        }

        let replaced: usize = ordered.iter().map(|edit| edit.byte_end - edit.byte_start).sum();
        let inserted: usize = ordered.iter().map(|edit| edit.new_text.len()).sum();
        let mut code = String::with_capacity(self.source.len() - replaced + inserted);
        let mut segments = Vec::with_capacity(ordered.len() * 2 + 1);
        let mut cursor = 0;

        for edit in ordered {
            if edit.byte_start > cursor {
                push_unchanged(&mut code, &mut segments, self.source, cursor..edit.byte_start);
            }
            let generated_start = code.len();
            code.push_str(&edit.new_text);
            segments.push(Segment {
                generated: generated_start..code.len(),
                original: edit.span(),
                kind: SegmentKind::Replaced,
            });
            cursor = edit.byte_end;
        }

        if cursor < self.source.len() {
            push_unchanged(
                &mut code,
                &mut segments,
                self.source,
                cursor..self.source.len(),
            );
        }

        let map = PositionMap {
            segments,
            original_len: self.source.len(),
            generated_len: code.len(),
        };
        Ok(Spliced { code, map })
    }
}

fn push_unchanged(code: &mut String, segments: &mut Vec<Segment>, source: &str, span: Range<usize>) {
    let generated_start = code.len();
    code.push_str(&source[span.clone()]);
    segments.push(Segment {
        generated: generated_start..code.len(),
        original: span,
        kind: SegmentKind::Unchanged,
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Copied verbatim from the original text
    Unchanged,
    /// Replacement text for an overwritten range
    Replaced,
}

/// One contiguous region of the output and the input region it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub generated: Range<usize>,
    pub original: Range<usize>,
    pub kind: SegmentKind,
}

/// Correlates byte offsets of spliced output with the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMap {
    segments: Vec<Segment>,
    original_len: usize,
    generated_len: usize,
}

impl PositionMap {
    /// Segments in output order; together they cover the whole output.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Map an output byte offset back to the original text.
    ///
    /// Offsets inside unchanged text map exactly; offsets inside a
    /// replacement map to the start of the range it replaced.
    pub fn original_offset(&self, generated: usize) -> Option<usize> {
        if generated == self.generated_len {
            return Some(self.original_len);
        }

        let index = self
            .segments
            .partition_point(|segment| segment.generated.end <= generated);
        let segment = self.segments.get(index)?;
        if segment.generated.start > generated {
            return None;
        }

        match segment.kind {
            SegmentKind::Unchanged => {
                Some(segment.original.start + (generated - segment.generated.start))
            }
            SegmentKind::Replaced => Some(segment.original.start),
        }
    }

    pub fn original_len(&self) -> usize {
        self.original_len
    }

    pub fn generated_len(&self) -> usize {
        self.generated_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_edit_validation_invalid_range() {
        let edit = Edit::new(5, 20, "replacement");
        assert!(matches!(
            edit.validate("hello world"),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn test_edit_validation_inverted_range() {
        let edit = Edit::new(10, 5, "replacement");
        assert!(matches!(
            edit.validate("hello world"),
            Err(EditError::InvalidByteRange { .. })
        ));
    }

    #[test]
    fn test_edit_validation_empty_range() {
        let edit = Edit::new(3, 3, "x");
        assert_eq!(
            edit.validate("hello"),
            Err(EditError::EmptyRange { byte_start: 3 })
        );
    }

    #[test]
    fn test_edit_validation_char_boundary() {
        let edit = Edit::new(1, 2, "x");
        assert!(matches!(
            edit.validate("é"),
            Err(EditError::InvalidUtf8Edit { .. })
        ));
    }

    #[test]
    fn test_batch_edits_any_order() {
        let source = "line1\nline2\nline3\n";
        let mut forward = Splicer::new(source);
        forward.overwrite(0, 5, "LINE1").unwrap();
        forward.overwrite(6, 11, "L2").unwrap();
        forward.overwrite(12, 17, "LINE_THREE").unwrap();

        let mut backward = Splicer::new(source);
        backward.overwrite(12, 17, "LINE_THREE").unwrap();
        backward.overwrite(6, 11, "L2").unwrap();
        backward.overwrite(0, 5, "LINE1").unwrap();

        let spliced = forward.apply().unwrap();
        assert_eq!(spliced.code, "LINE1\nL2\nLINE_THREE\n");
        assert_eq!(spliced, backward.apply().unwrap());
    }

    #[test]
    fn test_overlapping_edits_fail_on_apply() {
        let mut splicer = Splicer::new("abcdefgh");
        splicer.overwrite(0, 4, "X").unwrap();
        splicer.overwrite(3, 6, "Y").unwrap();

        assert_eq!(
            splicer.apply(),
            Err(EditError::Overlap {
                first_start: 0,
                first_end: 4,
                second_start: 3,
                second_end: 6,
            })
        );
    }

    #[test]
    fn test_adjacent_edits_are_allowed() {
        let mut splicer = Splicer::new("abcdef");
        splicer.overwrite(0, 3, "1").unwrap();
        splicer.overwrite(3, 6, "2").unwrap();
        assert_eq!(splicer.apply().unwrap().code, "12");
    }

    #[test]
    fn test_position_map_offsets() {
        let source = "<a>{x}</a> tail";
        let mut splicer = Splicer::new(source);
        splicer.overwrite(3, 6, "REPLACED").unwrap();
        let spliced = splicer.apply().unwrap();
        assert_eq!(spliced.code, "<a>REPLACED</a> tail");

        let map = &spliced.map;
        assert_eq!(map.segments().len(), 3);
        assert_eq!(map.original_offset(1), Some(1));
        assert_eq!(map.original_offset(3), Some(3));
        assert_eq!(map.original_offset(8), Some(3));
        // "</a>" starts at 11 in the output and 6 in the source
        assert_eq!(map.original_offset(11), Some(6));
        assert_eq!(map.original_offset(spliced.code.len()), Some(source.len()));
        assert_eq!(map.original_offset(spliced.code.len() + 1), None);
    }

    #[test]
    fn test_no_edits_is_identity() {
        let spliced = Splicer::new("unchanged").apply().unwrap();
        assert_eq!(spliced.code, "unchanged");
        assert_eq!(spliced.map.segments().len(), 1);
    }

    proptest! {
        #[test]
        fn untouched_text_is_preserved(
            prefix in "[a-z <>/]{0,40}",
            middle in "[a-z]{1,20}",
            suffix in "[a-z <>/\n]{0,40}",
            replacement in "[A-Z]{0,20}",
        ) {
            let source = format!("{prefix}{middle}{suffix}");
            let mut splicer = Splicer::new(&source);
            splicer
                .overwrite(prefix.len(), prefix.len() + middle.len(), replacement.clone())
                .unwrap();
            let spliced = splicer.apply().unwrap();

            prop_assert_eq!(spliced.code, format!("{prefix}{replacement}{suffix}"));
            for offset in 0..prefix.len() {
                prop_assert_eq!(spliced.map.original_offset(offset), Some(offset));
            }
            let shift = replacement.len() as isize - middle.len() as isize;
            for offset in 0..suffix.len() {
                let original = prefix.len() + middle.len() + offset;
                let generated = (original as isize + shift) as usize;
                prop_assert_eq!(spliced.map.original_offset(generated), Some(original));
            }
        }
    }
}
