use crate::ts::errors::TreeSitterError;
use crate::ts::parser::{ParsedSource, SourceParser};
use ast_grep_language::SupportLang;

/// Lines of context shown around the offending line in a code frame.
const FRAME_CONTEXT: usize = 2;

/// Validate that source code has no syntax errors under `language`.
///
/// Returns the first ERROR or MISSING node as a [`TreeSitterError::SyntaxError`].
pub fn validate_syntax(source: &str, language: SupportLang) -> Result<(), TreeSitterError> {
    let mut parser = SourceParser::new(language)?;
    let parsed = parser.parse_with_source(source)?;
    check_parsed(&parsed)
}

/// Report the first ERROR or MISSING node of an already parsed source.
pub fn check_parsed(parsed: &ParsedSource<'_>) -> Result<(), TreeSitterError> {
    let source = parsed.source;
    match parsed.error_nodes().first() {
        None => Ok(()),
        Some(error) => {
            let (line, column) = line_col(source, error.byte_start);
            Err(TreeSitterError::SyntaxError {
                byte_start: error.byte_start,
                byte_end: error.byte_end,
                line,
                column,
            })
        }
    }
}

/// 1-based line and column (in characters) of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut offset = offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |n| n + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

/// Render a code frame pointing at `byte_start..byte_end`.
///
/// ```text
///   1 | let x = 1;
/// > 2 | const a= b:number) =>4
///     |           ^
///   3 | let y = 2;
/// ```
pub fn code_frame(source: &str, byte_start: usize, byte_end: usize) -> String {
    let (line, column) = line_col(source, byte_start);
    let lines: Vec<&str> = source.split('\n').collect();
    let first = line.saturating_sub(FRAME_CONTEXT).max(1);
    let last = (line + FRAME_CONTEXT).min(lines.len());
    let width = last.to_string().len();

    let line_text = lines.get(line - 1).copied().unwrap_or("");
    let span_chars = source
        .get(byte_start.min(source.len())..byte_end.min(source.len()))
        .map_or(0, |span| span.chars().take_while(|c| *c != '\n').count());
    let remaining = line_text.chars().count().saturating_sub(column - 1);
    let carets = span_chars.min(remaining).max(1);

    let mut frame = Vec::with_capacity(last - first + 2);
    for number in first..=last {
        let text = lines[number - 1].trim_end_matches('\r');
        let marker = if number == line { '>' } else { ' ' };
        let gutter = format!("{marker} {number:>width$} |");
        if text.is_empty() {
            frame.push(gutter);
        } else {
            frame.push(format!("{gutter} {text}"));
        }
        if number == line {
            frame.push(format!(
                "  {:>width$} | {}{}",
                "",
                " ".repeat(column - 1),
                "^".repeat(carets)
            ));
        }
    }

    frame.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_valid_syntax() {
        assert!(validate_syntax("const a = (b: number) => 4", SupportLang::TypeScript).is_ok());
        assert!(validate_syntax("body { color: red; }", SupportLang::Css).is_ok());
    }

    #[test]
    fn validate_invalid_syntax() {
        let result = validate_syntax("const a= b:number) =>4", SupportLang::TypeScript);
        assert!(matches!(
            result,
            Err(TreeSitterError::SyntaxError { line: 1, .. })
        ));
    }

    #[test]
    fn line_col_counts_characters() {
        let source = "ab\ncdé f";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 3), (2, 1));
        assert_eq!(line_col(source, source.find('f').unwrap()), (2, 5));
    }

    #[test]
    fn code_frame_marks_line_and_column() {
        let source = "let x = 1;\nconst a= b:number) =>4\nlet y = 2;";
        let start = source.find(')').unwrap();
        let frame = code_frame(source, start, start + 1);

        let expected = format!(
            "  1 | let x = 1;\n> 2 | const a= b:number) =>4\n    | {}^\n  3 | let y = 2;",
            " ".repeat(17)
        );
        assert_eq!(frame, expected);
    }

    #[test]
    fn code_frame_zero_width_span_has_one_caret() {
        let frame = code_frame("abc", 3, 3);
        assert_eq!(frame, "> 1 | abc\n    |    ^");
    }
}
