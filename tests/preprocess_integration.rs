//! End-to-end tests for the markup preprocessor.

use pretty_assertions::assert_eq;
use std::path::PathBuf;
use svelte_highlight_preprocess::{
    highlight, DiagnosticKind, FormatOverrides, HighlightOptions, IgnorePath, MarkupInput,
    Processed,
};

const TYPESCRIPT_MESSY: &str = r#"<pre data-language="typescript">{'const a= (b:number) =>4'}</pre>"#;
const TYPESCRIPT_STRING: &str =
    r#"<pre data-language="typescript">{'const a = (b: number) => 4'}</pre>"#;
const TYPESCRIPT_QUASIS: &str =
    r#"<pre data-language="typescript">{`const a = (b: number) => 4`}</pre>"#;
const TYPESCRIPT_QUASIS_LINE_BREAKS: &str = "<pre data-language=\"typescript\">\n  \n  {`const a = (b: number) => 4`}\n  </pre>";
const TYPESCRIPT_NO_CODE: &str = r#"<pre data-language="typescript" />"#;
const TYPESCRIPT_NO_LANGUAGE: &str = r#"<pre>{'const a = (b: number) => 4'}</pre>"#;
const TYPESCRIPT_FORMATTING_ERROR: &str =
    r#"<pre data-language="typescript">{'const a= b:number) =>4'}</pre>"#;
const INVALID_LANG: &str = r#"<pre data-language="hypescript">{'hype'}</pre>"#;
const SVELTE: &str = "<pre data-language=\"svelte\">{`\n  <script>\n    let count = 0;\n  </script>\n  \n  {@html count}\n  `}\n  </pre>";
const HTML: &str = "<pre data-language=\"html\">{`\n  <script>\n    let count = 0;\n  </script>\n  \n  {@html count}\n  `}\n  </pre>";
const SVELTE_MULTILINE: &str = r#"<pre data-language="svelte">{`
  <script>
    import Highlight from "svelte-highlight";
    import typescript from "svelte-highlight/languages/typescript";
    import atomOneDark from "svelte-highlight/styles/atom-one-dark";
  
    const code = "const add = (a: number, b: number) => a + b;";
  </script>
  
  <svelte:head>
    {@html atomOneDark}
  </svelte:head>
  
  <Highlight language={typescript} {code} />`}</pre>"#;
const ESCAPED_BACKTICK: &str = r#"<pre data-language="javascript">{`let s = \`hi\`;`}</pre>"#;
const ESCAPED_SUBSTITUTION: &str =
    r#"<pre data-language="javascript">{`const t = \`\${x}\`;`}</pre>"#;
const TRIM_LINE_BREAKS: &str =
    "<pre data-language=\"typescript\">{`\n  const a = (b: number) => 4\n  \n  \n  `}</pre>";
const AUTO_HIGHLIGHT: &str = "<pre data-language>{`body { color: red; }`}</pre>";
const AUTO_HIGHLIGHT_EXPLICIT: &str = "<pre data-language=\"auto\">{`body { color: red; }`}</pre>";

fn run(content: &str, filename: Option<&str>, options: HighlightOptions) -> Option<Processed> {
    highlight(options)
        .markup(MarkupInput::new(content, filename))
        .unwrap()
}

fn processed(content: &str) -> Processed {
    run(content, Some("App.svelte"), HighlightOptions::default()).unwrap()
}

fn p(content: &str) -> String {
    processed(content).code
}

fn diagnostics(content: &str) -> Vec<String> {
    processed(content)
        .diagnostics
        .iter()
        .map(ToString::to_string)
        .collect()
}

#[test]
fn filter_no_file_name() {
    assert!(run("content", None, HighlightOptions::default()).is_none());
    assert!(run("content", Some(""), HighlightOptions::default()).is_none());
}

#[test]
fn filter_skipped_file() {
    let options = HighlightOptions::default;
    assert!(run("content", Some("/node_modules/App.svelte"), options()).is_none());
    assert!(run("content", Some("/.svelte-kit/App.svelte"), options()).is_none());
}

#[test]
fn filter_no_content() {
    assert!(run("", Some("App.svelte"), HighlightOptions::default()).is_none());
}

#[test]
fn filter_custom_ignore_path() {
    let options = || HighlightOptions {
        ignore_path: Some(IgnorePath::predicate(|path| path.contains("demo"))),
        ..HighlightOptions::default()
    };

    let code = |filename| run("content", Some(filename), options()).map(|p| p.code);
    assert_eq!(code("/node_modules/App.svelte").as_deref(), Some("content"));
    assert_eq!(code("/.svelte-kit/App.svelte").as_deref(), Some("content"));
    assert_eq!(code("/demo/App.svelte"), None);
}

#[test]
fn typescript_string_output_shape() {
    let code = p(TYPESCRIPT_STRING);
    assert!(code.starts_with("<pre><code class=\"hljs\">{@html `"));
    assert!(code.ends_with("`}</code></pre>"));
    assert!(code.contains("<span class=\"hljs-keyword\">const</span>"));
    assert!(code.contains("<span class=\"hljs-number\">4</span>"));
    assert!(diagnostics(TYPESCRIPT_STRING).is_empty());
}

#[test]
fn typescript_messy_string_is_formatted() {
    assert_eq!(p(TYPESCRIPT_MESSY), p(TYPESCRIPT_STRING));
    assert!(diagnostics(TYPESCRIPT_MESSY).is_empty());
}

#[test]
fn typescript_quasis_equal_string() {
    assert_eq!(p(TYPESCRIPT_QUASIS), p(TYPESCRIPT_STRING));
}

#[test]
fn typescript_quasis_with_line_breaks() {
    assert_eq!(p(TYPESCRIPT_QUASIS_LINE_BREAKS), p(TYPESCRIPT_QUASIS));
}

#[test]
fn typescript_no_code() {
    assert_eq!(p(TYPESCRIPT_NO_CODE), TYPESCRIPT_NO_CODE);
    assert_eq!(
        diagnostics(TYPESCRIPT_NO_CODE),
        vec!["[App.svelte] No code provided"]
    );
}

#[test]
fn typescript_no_language() {
    assert_eq!(p(TYPESCRIPT_NO_LANGUAGE), TYPESCRIPT_NO_LANGUAGE);
    assert!(diagnostics(TYPESCRIPT_NO_LANGUAGE).is_empty());
}

#[test]
fn typescript_formatting_error() {
    let result = processed(TYPESCRIPT_FORMATTING_ERROR);

    assert!(result.code.starts_with("<pre><code class=\"hljs\">{@html `"));
    assert_eq!(result.diagnostics.len(), 1);

    let diagnostic = &result.diagnostics[0];
    assert_eq!(diagnostic.kind, DiagnosticKind::FormatFailed);
    assert_eq!(diagnostic.message, "Formatting error");
    let detail = diagnostic.detail.as_deref().unwrap();
    assert!(detail.starts_with("SyntaxError: Unexpected token (1:"));
    assert!(detail.contains("> 1 | const a= b:number) =>4"));
}

#[test]
fn invalid_language() {
    let result = processed(INVALID_LANG);

    assert_eq!(result.code, INVALID_LANG);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].to_string(),
        "[App.svelte] Invalid language \"hypescript\""
    );
    assert_eq!(
        result.diagnostics[0].kind,
        DiagnosticKind::InvalidLanguage {
            language: "hypescript".to_string(),
            suggestion: Some("typescript".to_string()),
        }
    );
}

#[test]
fn svelte() {
    let result = processed(SVELTE);
    assert!(result.code.starts_with("<pre><code class=\"hljs\">{@html `"));
    assert!(result.code.contains("&lt;"));
    assert!(!result.code.contains("<script>"));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn svelte_is_an_alias_for_html() {
    let svelte = processed(SVELTE);
    let html = processed(HTML);

    assert_eq!(svelte.code, html.code);
    assert_eq!(svelte.blocks[0].language, "svelte");
    assert_eq!(html.blocks[0].language, "html");
    assert_eq!(
        svelte.blocks[0].detected_language,
        html.blocks[0].detected_language
    );
}

#[test]
fn svelte_multiline() {
    let result = processed(SVELTE_MULTILINE);

    assert_eq!(result.blocks.len(), 1);
    assert_eq!(result.blocks[0].span, 0..SVELTE_MULTILINE.len());
    assert!(result.diagnostics.is_empty());
    assert!(result.code.starts_with("<pre><code class=\"hljs\">{@html `"));
    assert!(result.code.ends_with("`}</code></pre>"));
    assert!(result.code.contains("svelte-highlight/styles/atom-one-dark"));
    assert!(result.code.contains("atomOneDark"));
}

#[test]
fn template_escapes_are_not_doubled() {
    let result = processed(ESCAPED_BACKTICK);

    assert!(result.diagnostics.is_empty());
    assert!(result.code.contains(r#"<span class="hljs-string">\`hi\`</span>"#));
    assert!(!result.code.contains(r"\\"));

    let code = p(ESCAPED_SUBSTITUTION);
    assert!(code.contains(r"\${x}"));
    assert!(!code.contains(r"\\"));
}

#[test]
fn string_payload_backticks_are_escaped_once() {
    let quoted = p(r#"<pre data-language="javascript">{'let s = `hi`;'}</pre>"#);
    assert_eq!(quoted, p(ESCAPED_BACKTICK));
}

#[test]
fn trim_line_breaks() {
    assert_eq!(p(TRIM_LINE_BREAKS), p(TYPESCRIPT_QUASIS));
}

#[test]
fn multiple() {
    let block = p(TYPESCRIPT_STRING);
    let result = processed(&format!("{TYPESCRIPT_MESSY}\n\n{TYPESCRIPT_STRING}"));

    assert_eq!(result.code, format!("{block}\n\n{block}"));
    assert_eq!(result.blocks.len(), 2);
    assert_eq!(result.blocks[0].span, 0..TYPESCRIPT_MESSY.len());
    let second = TYPESCRIPT_MESSY.len() + 2;
    assert_eq!(
        result.blocks[1].span,
        second..second + TYPESCRIPT_STRING.len()
    );
}

#[test]
fn auto_highlight() {
    assert_eq!(p(AUTO_HIGHLIGHT), p(AUTO_HIGHLIGHT_EXPLICIT));

    let result = processed(AUTO_HIGHLIGHT);
    assert_eq!(result.blocks[0].language, "auto");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn source_map_points_at_original() {
    let content = format!("{TYPESCRIPT_STRING}\n<p>after</p>");
    let result = processed(&content);

    assert_eq!(result.map.version, 3);
    assert_eq!(result.map.sources, vec!["App.svelte"]);
    assert_eq!(result.map.sources_content, Some(vec![content.clone()]));

    let mappings = result.map.decode_mappings().unwrap();
    let first = mappings[0];
    assert_eq!((first.generated_line, first.generated_column), (0, 0));
    assert_eq!((first.original_line, first.original_column), (0, 0));

    let after = mappings
        .iter()
        .find(|m| m.generated_line == 1 && m.generated_column == 0)
        .unwrap();
    assert_eq!((after.original_line, after.original_column), (1, 0));

    let json: serde_json::Value = serde_json::from_str(&result.map.to_json().unwrap()).unwrap();
    assert!(json.get("sourcesContent").is_some());
    assert!(json["mappings"].as_str().unwrap().starts_with("AAAA"));
}

#[test]
fn surrounding_markup_is_untouched() {
    let content = format!("<script>\n  let x = 1;\n</script>\n\n<h1>{{x}}</h1>\n{TYPESCRIPT_STRING}\n<footer />");
    let result = processed(&content);
    let block = p(TYPESCRIPT_STRING);

    assert_eq!(
        result.code,
        format!("<script>\n  let x = 1;\n</script>\n\n<h1>{{x}}</h1>\n{block}\n<footer />")
    );
}

#[test]
fn formatter_options_are_applied() {
    let content = "<pre data-language=\"javascript\">{`if (a) {\n    b();\n}`}</pre>";
    let options = HighlightOptions {
        formatter_options: FormatOverrides {
            use_tabs: Some(true),
            tab_width: Some(4),
            ..FormatOverrides::default()
        },
        ..HighlightOptions::default()
    };
    let result = run(content, Some("App.svelte"), options).unwrap();
    assert!(result.code.contains("\n\t"));
}

#[test]
fn diagnostic_paths_are_relative_to_base_dir() {
    let options = HighlightOptions {
        base_dir: Some(PathBuf::from("/project")),
        ..HighlightOptions::default()
    };
    let result = run(TYPESCRIPT_NO_CODE, Some("/project/src/App.svelte"), options).unwrap();
    assert_eq!(
        result.diagnostics[0].to_string(),
        "[src/App.svelte] No code provided"
    );
}

#[test]
fn one_preprocessor_serves_many_threads() {
    let preprocessor = highlight(HighlightOptions::default());
    let expected = p(TYPESCRIPT_STRING);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    preprocessor
                        .markup(MarkupInput::new(TYPESCRIPT_MESSY, "App.svelte"))
                        .unwrap()
                        .unwrap()
                        .code
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
