use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::{File, Language};

/// Stand-in compared against when a learner file has no solution counterpart.
pub const SOLUTION_PLACEHOLDER: &str = "// This file doesn't have a solution.";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comparison {
    pub all_match: bool,
    pub incorrect_files: Vec<File>,
}

/// Compares every learner file with the same-named solution file.
///
/// Patch files and files without a solution always count as correct.
/// Incorrect files keep the order they had in `files`.
pub fn compare_files(files: &[File], solution: &[File]) -> Comparison {
    let mut incorrect_files = Vec::new();

    for file in files {
        if file.is_diff() {
            continue;
        }

        let solution_file = solution
            .iter()
            .find(|candidate| candidate.file_name == file.file_name);

        let language = Language::from_file_name(&file.file_name);
        let file_content = normalize(&file.code, language);
        let solution_content = normalize(
            solution_file
                .map(|solution_file| solution_file.code.as_str())
                .unwrap_or(SOLUTION_PLACEHOLDER),
            language,
        );

        let is_correct = file_content == solution_content || solution_file.is_none();

        if !is_correct {
            incorrect_files.push(file.clone());
        }
    }

    Comparison {
        all_match: incorrect_files.is_empty(),
        incorrect_files,
    }
}

/// Strips comments, collapses whitespace runs to one space and trims.
pub fn normalize(code: &str, language: Language) -> String {
    let stripped = strip_comments(code, language);

    WHITESPACE.replace_all(&stripped, " ").trim().to_owned()
}

/// Removes `//` line comments and `/* */` block comments outside string
/// literals. Block comments become a single space so that removing one can
/// never glue two tokens into a new comment opener.
///
/// Python `#` comments are kept verbatim up to the end of the line.
pub fn strip_comments(code: &str, language: Language) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut output = String::with_capacity(code.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match (c, next) {
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
                output.push(' ');
            }
            ('#', _) if language == Language::Python => {
                while i < chars.len() && chars[i] != '\n' {
                    output.push(chars[i]);
                    i += 1;
                }
            }
            ('\'', _) if language == Language::Rust && is_lifetime(&chars, i) => {
                output.push(c);
                i += 1;
            }
            ('"', _) | ('\'', _) | ('`', _) if language.has_string_literals() => {
                i = copy_string_literal(&chars, i, &mut output);
            }
            _ => {
                output.push(c);
                i += 1;
            }
        }
    }

    output
}

/// `'a` followed by anything but a closing quote is a lifetime or label,
/// not a char literal.
fn is_lifetime(chars: &[char], quote: usize) -> bool {
    let mut end = quote + 1;

    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }

    end > quote + 1 && chars.get(end) != Some(&'\'')
}

fn copy_string_literal(chars: &[char], start: usize, output: &mut String) -> usize {
    let quote = chars[start];
    let mut i = start + 1;

    output.push(quote);

    while i < chars.len() {
        let c = chars[i];
        output.push(c);
        i += 1;

        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                output.push(escaped);
                i += 1;
            }
        } else if c == quote {
            break;
        }
    }

    i
}

/// Result of checking the learner's answer, as the editor displays it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationState {
    pub does_match: bool,
    pub incorrect_files: Vec<File>,
    pub checked_answer: bool,
    pub show_hints: bool,
}

impl ValidationState {
    pub fn validate(&mut self, files: &[File], solution: &[File]) -> bool {
        let Comparison {
            all_match,
            incorrect_files,
        } = compare_files(files, solution);

        self.incorrect_files = incorrect_files;
        self.does_match = all_match;
        self.checked_answer = true;
        self.show_hints = !all_match;

        all_match
    }

    pub fn set_show_hints(&mut self, show_hints: bool) {
        self.show_hints = show_hints;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, code: &str) -> File {
        File::new(name, code)
    }

    #[test]
    fn matching_files_ignore_comments_and_layout() {
        let files = vec![file(
            "lib.rs",
            "// entry point\npub fn add(a: u32, b: u32) -> u32 {\n    a + b /* sum */\n}\n",
        )];
        let solution = vec![file("lib.rs", "pub fn add(a: u32, b: u32) -> u32 { a + b }")];

        let comparison = compare_files(&files, &solution);

        assert!(comparison.all_match);
        assert!(comparison.incorrect_files.is_empty());
    }

    #[test]
    fn mismatching_files_are_reported_in_order() {
        let files = vec![
            file("a.rs", "fn a() {}"),
            file("b.rs", "fn b() { todo!() }"),
            file("c.rs", "fn c() {}"),
            file("d.rs", "fn d() { 1 }"),
        ];
        let solution = vec![
            file("d.rs", "fn d() { 2 }"),
            file("c.rs", "fn c() {}"),
            file("b.rs", "fn b() { 1 }"),
            file("a.rs", "fn a() {}"),
        ];

        let comparison = compare_files(&files, &solution);

        assert!(!comparison.all_match);
        let names: Vec<_> = comparison
            .incorrect_files
            .iter()
            .map(|file| file.file_name.as_str())
            .collect();
        assert_eq!(names, ["b.rs", "d.rs"]);
    }

    #[test]
    fn patch_files_are_never_compared() {
        let files = vec![file("step.diff", "+ anything at all")];
        let solution = vec![file("step.diff", "- something else")];

        assert!(compare_files(&files, &solution).all_match);
    }

    #[test]
    fn file_without_solution_counts_as_correct() {
        let files = vec![file("extra.ts", "export const x = 1;")];

        let comparison = compare_files(&files, &[]);

        assert!(comparison.all_match);
        assert!(comparison.incorrect_files.is_empty());
    }

    #[test]
    fn comment_markers_inside_strings_are_kept() {
        let code = r#"const url = "https://example.com"; // trailing"#;

        assert_eq!(
            normalize(code, Language::JavaScript),
            r#"const url = "https://example.com";"#
        );
    }

    #[test]
    fn rust_lifetimes_do_not_open_char_literals() {
        let code = "fn f<'a>(x: &'a str) -> char { 'x' } // done";

        assert_eq!(
            normalize(code, Language::Rust),
            "fn f<'a>(x: &'a str) -> char { 'x' }"
        );
    }

    #[test]
    fn apostrophes_in_prose_do_not_hide_comments() {
        assert_eq!(
            normalize("don't panic // aside", Language::Markdown),
            "don't panic"
        );
        assert_eq!(
            normalize("x = 1  # don't\ny = 2 // aside", Language::Python),
            "x = 1 # don't y = 2"
        );

        let files = vec![file("notes.txt", "it's done // first try")];
        let solution = vec![file("notes.txt", "it's done // reference")];
        assert!(compare_files(&files, &solution).all_match);
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "let a = 1; // one\nlet b = /* two */ 2;",
            "/ /* split */ / not a comment",
            "const s = 'it\\'s'; /* tail",
            "fn f<'a>(s: &'a str) {\n    // body\n}",
            "  \t\n  ",
        ];

        for sample in samples {
            for language in [Language::JavaScript, Language::Rust, Language::Python, Language::Text] {
                let once = normalize(sample, language);
                assert_eq!(normalize(&once, language), once, "sample: {sample:?}");
            }
        }
    }

    #[test]
    fn validate_updates_editor_state() {
        let mut state = ValidationState::default();
        let files = vec![file("main.py", "print('hi')")];
        let solution = vec![file("main.py", "print('bye')")];

        assert!(!state.validate(&files, &solution));
        assert!(state.checked_answer);
        assert!(state.show_hints);
        assert_eq!(state.incorrect_files, files);

        assert!(state.validate(&solution, &solution));
        assert!(state.does_match);
        assert!(!state.show_hints);
        assert!(state.incorrect_files.is_empty());

        state.reset();
        assert_eq!(state, ValidationState::default());
    }
}
