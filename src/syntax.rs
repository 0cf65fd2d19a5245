//! Regex-based, line-at-a-time syntax coloring.
//!
//! The highlighter never changes text: the segments it returns cover the
//! input line exactly, so concatenating them yields the original bytes.

use std::ops::Range;
use std::path::Path;

use ratatui::style::{Color, Style};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Go,
    Python,
    JavaScript,
    Html,
    #[default]
    PlainText,
}

impl Language {
    /// Detect the language from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("go") => Language::Go,
            Some("py") => Language::Python,
            Some("js") => Language::JavaScript,
            Some("html") => Language::Html,
            _ => Language::PlainText,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Go => "go",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Html => "html",
            Language::PlainText => "plaintext",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A styled byte range of a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub range: Range<usize>,
    pub style: Style,
}

struct Rule {
    regex: Regex,
    /// Capture group whose span is styled; 0 is the whole match.
    group: usize,
    style: Style,
}

pub fn keyword_style() -> Style {
    Style::default().fg(Color::Rgb(0x56, 0x9c, 0xd6))
}

pub fn string_style() -> Style {
    Style::default().fg(Color::Rgb(0xce, 0x91, 0x78))
}

pub fn number_style() -> Style {
    Style::default().fg(Color::Rgb(0xb5, 0xce, 0xa8))
}

pub fn comment_style() -> Style {
    Style::default().fg(Color::Rgb(0x6a, 0x99, 0x55))
}

pub fn type_style() -> Style {
    Style::default().fg(Color::Rgb(0x4e, 0xc9, 0xb0))
}

pub fn function_style() -> Style {
    Style::default().fg(Color::Rgb(0xdc, 0xdc, 0xaa))
}

const NUMBER: &str = r"\b\d+(\.\d+)?\b";
const FUNCTION_CALL: &str = r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(";
const DOUBLE_QUOTED: &str = r#""(?:[^"\\]|\\.)*""#;
const SINGLE_QUOTED: &str = r"'(?:[^'\\]|\\.)*'";

const GO_KEYWORDS: &[&str] = &[
    "package", "import", "func", "return", "if", "else", "for", "range", "var", "const", "type",
    "struct", "interface", "map", "chan", "go", "select", "case", "break", "continue", "default",
    "switch", "defer",
];
const GO_BUILTINS: &[&str] = &[
    "string", "int", "int64", "float64", "bool", "byte", "rune", "error",
];
const PYTHON_KEYWORDS: &[&str] = &[
    "def", "return", "if", "elif", "else", "for", "while", "import", "from", "class", "self", "in",
    "is", "and", "or", "not", "True", "False", "None",
];
const JS_KEYWORDS: &[&str] = &[
    "let", "const", "var", "function", "return", "if", "else", "for", "while", "class", "new",
    "try", "catch", "finally", "throw", "switch", "case", "break", "continue", "import", "export",
    "default", "async", "await",
];

fn words(list: &[&str]) -> String {
    format!(r"\b(?:{})\b", list.join("|"))
}

/// Compiled rule tables for every supported language.
pub struct Highlighter {
    go: Vec<Rule>,
    python: Vec<Rule>,
    javascript: Vec<Rule>,
    html: Vec<Rule>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let go = compile(&[
            (r#""[^"]*""#.to_string(), 0, string_style()),
            ("`[^`]*`".to_string(), 0, string_style()),
            (NUMBER.to_string(), 0, number_style()),
            (words(GO_KEYWORDS), 0, keyword_style()),
            (words(GO_BUILTINS), 0, type_style()),
            (FUNCTION_CALL.to_string(), 1, function_style()),
        ]);
        let python = compile(&[
            (DOUBLE_QUOTED.to_string(), 0, string_style()),
            (SINGLE_QUOTED.to_string(), 0, string_style()),
            (NUMBER.to_string(), 0, number_style()),
            (words(PYTHON_KEYWORDS), 0, keyword_style()),
            (FUNCTION_CALL.to_string(), 1, function_style()),
        ]);
        let javascript = compile(&[
            (DOUBLE_QUOTED.to_string(), 0, string_style()),
            (SINGLE_QUOTED.to_string(), 0, string_style()),
            (r"`(?:[^`\\]|\\.)*`".to_string(), 0, string_style()),
            (NUMBER.to_string(), 0, number_style()),
            (words(JS_KEYWORDS), 0, keyword_style()),
            (FUNCTION_CALL.to_string(), 1, function_style()),
        ]);
        let html = compile(&[
            (r"<!--.*?-->".to_string(), 0, comment_style()),
            (DOUBLE_QUOTED.to_string(), 0, string_style()),
            (r"</?[A-Za-z0-9]+".to_string(), 0, keyword_style()),
            (r"\b([A-Za-z-]+)=".to_string(), 1, type_style()),
            (">".to_string(), 0, keyword_style()),
        ]);

        Self {
            go,
            python,
            javascript,
            html,
        }
    }

    fn rules(&self, language: Language) -> &[Rule] {
        match language {
            Language::Go => &self.go,
            Language::Python => &self.python,
            Language::JavaScript => &self.javascript,
            Language::Html => &self.html,
            Language::PlainText => &[],
        }
    }

    /// Split `line` into styled segments that cover it exactly.
    pub fn highlight(&self, line: &str, language: Language) -> Vec<Segment> {
        if line.is_empty() {
            return Vec::new();
        }

        let comment_prefix = match language {
            Language::Go | Language::JavaScript => Some("//"),
            Language::Python => Some("#"),
            _ => None,
        };
        if comment_prefix.is_some_and(|p| line.trim_start().starts_with(p)) {
            return vec![Segment {
                range: 0..line.len(),
                style: comment_style(),
            }];
        }

        // Owner rule per byte; earlier rules win and partial overlaps are skipped.
        let mut owner: Vec<Option<usize>> = vec![None; line.len()];
        for (idx, rule) in self.rules(language).iter().enumerate() {
            for caps in rule.regex.captures_iter(line) {
                let Some(m) = caps.get(rule.group) else {
                    continue;
                };
                let span = m.start()..m.end();
                if span.is_empty() || owner[span.clone()].iter().any(Option::is_some) {
                    continue;
                }
                owner[span].iter_mut().for_each(|o| *o = Some(idx));
            }
        }

        let rules = self.rules(language);
        let mut segments = Vec::new();
        let mut start = 0;
        for i in 1..=line.len() {
            if i == line.len() || owner[i] != owner[start] {
                let style = owner[start]
                    .map(|idx| rules[idx].style)
                    .unwrap_or_default();
                segments.push(Segment {
                    range: start..i,
                    style,
                });
                start = i;
            }
        }
        segments
    }
}

fn compile(patterns: &[(String, usize, Style)]) -> Vec<Rule> {
    patterns
        .iter()
        .filter_map(|(pattern, group, style)| match Regex::new(pattern) {
            Ok(regex) => Some(Rule {
                regex,
                group: *group,
                style: *style,
            }),
            Err(e) => {
                tracing::warn!("skipping highlight rule {:?}: {}", pattern, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rebuild(line: &str, segments: &[Segment]) -> String {
        segments.iter().map(|s| &line[s.range.clone()]).collect()
    }

    #[test]
    fn test_language_from_extension() {
        assert_eq!(Language::from_path(Path::new("main.go")), Language::Go);
        assert_eq!(Language::from_path(Path::new("a/b.PY")), Language::Python);
        assert_eq!(Language::from_path(Path::new("x.js")), Language::JavaScript);
        assert_eq!(Language::from_path(Path::new("i.html")), Language::Html);
        assert_eq!(Language::from_path(Path::new("notes.txt")), Language::PlainText);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::PlainText);
    }

    #[test]
    fn test_segments_cover_line_exactly() {
        let highlighter = Highlighter::new();
        let cases = [
            ("func main() { return \"é\" + 42 }", Language::Go),
            ("def f(x): return 'a' if x else None", Language::Python),
            ("const s = `t` + foo(1.5);", Language::JavaScript),
            ("<a href=\"x\"><!-- c --></a>", Language::Html),
            ("plain words", Language::PlainText),
        ];
        for (line, lang) in cases {
            let segments = highlighter.highlight(line, lang);
            assert_eq!(rebuild(line, &segments), line, "{lang}");
        }
    }

    #[test]
    fn test_keyword_beats_function_call() {
        let highlighter = Highlighter::new();
        let line = "if (x)";
        let segments = highlighter.highlight(line, Language::JavaScript);
        assert_eq!(segments[0].range, 0..2);
        assert_eq!(segments[0].style, keyword_style());
    }

    #[test]
    fn test_comment_line_is_one_segment() {
        let highlighter = Highlighter::new();
        let segments = highlighter.highlight("   # note", Language::Python);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].style, comment_style());
    }

    #[test]
    fn test_empty_line_has_no_segments() {
        let highlighter = Highlighter::new();
        assert!(highlighter.highlight("", Language::Go).is_empty());
    }
}
