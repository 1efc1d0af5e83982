//! Comment lexer — line-by-line state machine over a SCSS file.
//!
//! Only comment delimiters matter here:
//!
//! - `/// text` lines form doc blocks, attached to the declaration that follows
//! - `////` lines form the poster comment (file-level, at most one per file)
//! - everything else is code, scanned just enough to reject broken input
//!
//! A poster opened by a bare `////` line must be closed by another bare
//! `////` line; a poster starting with `//// text` ends at the first line
//! that is not a poster line.

use crate::context;
use crate::error::{Error, Result};
use crate::model::{CommentBlock, Context, Warning};
use regex::Regex;
use std::sync::LazyLock;

static RE_POSTER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*////(.*)$").unwrap());

static RE_DOC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:blank:]]*///(.*)$").unwrap());

pub const MULTIPLE_POSTERS: &str = "You can't have more than one poster comment.";

/// A comment block and the context it documents (`None` for the poster).
#[derive(Debug, Clone, PartialEq)]
pub struct LexedBlock {
    pub block: CommentBlock,
    pub context: Option<Context>,
}

/// Result of lexing one file.
#[derive(Debug, Default)]
pub struct Lexed {
    pub blocks: Vec<LexedBlock>,
    pub warnings: Vec<Warning>,
}

impl Lexed {
    pub fn poster(&self) -> Option<&LexedBlock> {
        self.blocks.iter().find(|b| b.block.is_poster)
    }
}

// -- State machine ------------------------------------------------------------

enum State {
    Idle,
    InDocBlock {
        start: usize,
        lines: Vec<String>,
    },
    InPosterBlock {
        start: usize,
        lines: Vec<String>,
        explicit: bool,
    },
}

enum LineKind<'a> {
    Poster(&'a str),
    Doc(&'a str),
    Other,
}

struct Lexer<'a> {
    path: &'a str,
    lines: Vec<&'a str>,
    state: State,
    out: Lexed,
    has_poster: bool,
    code: CodeScan,
}

/// Lex a file into comment blocks with their contexts.
pub fn lex(path: &str, source: &str) -> Result<Lexed> {
    let mut lexer = Lexer {
        path,
        lines: source.lines().collect(),
        state: State::Idle,
        out: Lexed::default(),
        has_poster: false,
        code: CodeScan::default(),
    };

    for idx in 0..lexer.lines.len() {
        lexer.process_line(idx)?;
    }
    lexer.finish()
}

impl<'a> Lexer<'a> {
    fn process_line(&mut self, idx: usize) -> Result<()> {
        let line = self.lines[idx];

        // Comment markers inside a /* */ comment are plain text.
        let kind = if self.code.in_block_comment.is_some() {
            LineKind::Other
        } else {
            classify(line)
        };

        match kind {
            LineKind::Poster(text) => {
                let bare = text.trim().is_empty();
                match std::mem::replace(&mut self.state, State::Idle) {
                    State::InDocBlock { start, lines } => {
                        self.emit_doc(start, lines, idx);
                        self.open_poster(idx, text, bare);
                    }
                    State::InPosterBlock {
                        start,
                        mut lines,
                        explicit,
                    } => {
                        if bare {
                            self.emit_poster(start, lines, idx);
                        } else {
                            lines.push(strip_marker_space(text));
                            self.state = State::InPosterBlock {
                                start,
                                lines,
                                explicit,
                            };
                        }
                    }
                    State::Idle => self.open_poster(idx, text, bare),
                }
            }
            LineKind::Doc(text) => match std::mem::replace(&mut self.state, State::Idle) {
                State::InDocBlock { start, mut lines } => {
                    lines.push(strip_marker_space(text));
                    self.state = State::InDocBlock { start, lines };
                }
                State::InPosterBlock {
                    start,
                    explicit: true,
                    ..
                } => return Err(self.unterminated_poster(start)),
                State::InPosterBlock { start, lines, .. } => {
                    self.emit_poster(start, lines, idx - 1);
                    self.open_doc(idx, text);
                }
                State::Idle => self.open_doc(idx, text),
            },
            LineKind::Other => {
                match std::mem::replace(&mut self.state, State::Idle) {
                    State::InDocBlock { start, lines } => self.emit_doc(start, lines, idx),
                    State::InPosterBlock {
                        start,
                        explicit: true,
                        ..
                    } => return Err(self.unterminated_poster(start)),
                    State::InPosterBlock { start, lines, .. } => {
                        self.emit_poster(start, lines, idx - 1)
                    }
                    State::Idle => {}
                }
                self.code
                    .scan(line, idx + 1)
                    .map_err(|reason| self.syntax(idx + 1, reason))?;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Lexed> {
        let end = self.lines.len();
        match std::mem::replace(&mut self.state, State::Idle) {
            State::InDocBlock { start, lines } => self.emit_doc(start, lines, end),
            State::InPosterBlock {
                start,
                explicit: true,
                ..
            } => return Err(self.unterminated_poster(start)),
            State::InPosterBlock { start, lines, .. } => {
                self.emit_poster(start, lines, end.saturating_sub(1))
            }
            State::Idle => {}
        }

        if let Some(line) = self.code.in_block_comment {
            return Err(self.syntax(line, "unterminated `/*` comment".to_string()));
        }
        if let Some(&line) = self.code.open_braces.last() {
            return Err(self.syntax(line, "unclosed `{`".to_string()));
        }
        Ok(self.out)
    }

    fn open_doc(&mut self, idx: usize, text: &str) {
        self.state = State::InDocBlock {
            start: idx,
            lines: vec![strip_marker_space(text)],
        };
    }

    fn open_poster(&mut self, idx: usize, text: &str, bare: bool) {
        let lines = if bare {
            Vec::new()
        } else {
            vec![strip_marker_space(text)]
        };
        self.state = State::InPosterBlock {
            start: idx,
            lines,
            explicit: bare,
        };
    }

    /// `next` is the index of the first line after the block.
    fn emit_doc(&mut self, start: usize, lines: Vec<String>, next: usize) {
        let context = context::detect(&self.lines, next);
        tracing::trace!(path = self.path, line = start + 1, kind = %context.kind, "doc block");
        self.out.blocks.push(LexedBlock {
            block: CommentBlock {
                lines,
                is_poster: false,
                path: self.path.to_string(),
                start_line: start + 1,
                end_line: next,
            },
            context: Some(context),
        });
    }

    /// `last` is the index of the block's last line.
    fn emit_poster(&mut self, start: usize, lines: Vec<String>, last: usize) {
        if self.has_poster {
            self.out
                .warnings
                .push(Warning::new(MULTIPLE_POSTERS, self.path, start + 1));
            return;
        }
        self.has_poster = true;
        self.out.blocks.push(LexedBlock {
            block: CommentBlock {
                lines,
                is_poster: true,
                path: self.path.to_string(),
                start_line: start + 1,
                end_line: last + 1,
            },
            context: None,
        });
    }

    fn unterminated_poster(&self, start: usize) -> Error {
        self.syntax(start + 1, "unterminated poster comment".to_string())
    }

    fn syntax(&self, line: usize, reason: String) -> Error {
        Error::Syntax {
            path: self.path.to_string(),
            line,
            reason,
        }
    }
}

fn classify(line: &str) -> LineKind<'_> {
    if let Some(caps) = RE_POSTER_LINE.captures(line) {
        return LineKind::Poster(caps.get(1).map_or("", |m| m.as_str()));
    }
    if let Some(caps) = RE_DOC_LINE.captures(line) {
        return LineKind::Doc(caps.get(1).map_or("", |m| m.as_str()));
    }
    LineKind::Other
}

/// Drop the single space conventionally written after the marker.
fn strip_marker_space(text: &str) -> String {
    text.strip_prefix(' ').unwrap_or(text).trim_end().to_string()
}

// -- Code scan ----------------------------------------------------------------

/// Just enough of SCSS lexing to notice input that cannot be a stylesheet.
#[derive(Default)]
struct CodeScan {
    /// Line where the open `/*` comment started.
    in_block_comment: Option<usize>,
    /// Lines of currently open `{`.
    open_braces: Vec<usize>,
}

impl CodeScan {
    fn scan(&mut self, line: &str, line_no: usize) -> std::result::Result<(), String> {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if self.in_block_comment.is_some() {
                if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    self.in_block_comment = None;
                    i += 1;
                }
                i += 1;
                continue;
            }
            match bytes[i] {
                b'"' | b'\'' => {
                    let quote = bytes[i];
                    i += 1;
                    while i < bytes.len() && bytes[i] != quote {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    self.in_block_comment = Some(line_no);
                    i += 1;
                }
                b'/' if bytes.get(i + 1) == Some(&b'/')
                    && (i == 0 || bytes[i - 1].is_ascii_whitespace() || matches!(bytes[i - 1], b';' | b'{' | b'}')) =>
                {
                    return Ok(());
                }
                b'{' => self.open_braces.push(line_no),
                b'}' => {
                    if self.open_braces.pop().is_none() {
                        return Err("unmatched `}`".to_string());
                    }
                }
                // `$name` variable, `${` interpolation or the `[attr$=value]` selector.
                b'$' => {
                    let valid = bytes.get(i + 1).is_some_and(|&b| {
                        b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'{' | b'=') || b >= 0x80
                    });
                    if !valid {
                        return Err("unexpected `$`".to_string());
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContextKind;

    fn lex_ok(input: &str) -> Lexed {
        lex("test.scss", input).unwrap()
    }

    #[test]
    fn groups_consecutive_doc_lines() {
        let lexed = lex_ok("/// First line\n///   indented\n///\n/// last\n@function f() {}\n");
        assert_eq!(lexed.blocks.len(), 1);
        let block = &lexed.blocks[0].block;
        assert_eq!(block.lines, vec!["First line", "  indented", "", "last"]);
        assert_eq!(block.start_line, 1);
        assert_eq!(block.end_line, 4);
        let ctx = lexed.blocks[0].context.as_ref().unwrap();
        assert_eq!(ctx.kind, ContextKind::Function);
        assert_eq!(ctx.line.start, 5);
    }

    #[test]
    fn ordinary_comments_are_ignored() {
        let lexed = lex_ok("// plain\n/* block\n/// not doc\n*/\n$a: 1;\n");
        assert!(lexed.blocks.is_empty());
    }

    #[test]
    fn separate_blocks_get_own_contexts() {
        let input = "/// One\n$one: 1;\n\n/// Two\n@mixin two {}\n";
        let lexed = lex_ok(input);
        assert_eq!(lexed.blocks.len(), 2);
        assert_eq!(lexed.blocks[0].context.as_ref().unwrap().name, "one");
        assert_eq!(lexed.blocks[1].context.as_ref().unwrap().name, "two");
    }

    #[test]
    fn explicit_poster() {
        let lexed = lex_ok("////\n//// File docs\n//// @group utils\n////\n\n/// Item\n$a: 1;\n");
        let poster = lexed.poster().unwrap();
        assert_eq!(poster.block.lines, vec!["File docs", "@group utils"]);
        assert!(poster.context.is_none());
        assert_eq!(lexed.blocks.len(), 2);
    }

    #[test]
    fn implicit_poster_ends_at_first_other_line() {
        let lexed = lex_ok("//// @group utils\n/// Item\n$a: 1;\n");
        assert_eq!(lexed.poster().unwrap().block.lines, vec!["@group utils"]);
        assert_eq!(lexed.blocks.len(), 2);
        assert!(!lexed.blocks[1].block.is_poster);
    }

    #[test]
    fn second_poster_warns_and_is_dropped() {
        let input = "////\n////@group one\n////\n\n////\n////@group two\n////\n\n/// desc\n@function fail(){}";
        let lexed = lex_ok(input);
        assert_eq!(lexed.warnings.len(), 1);
        assert_eq!(lexed.warnings[0].message, MULTIPLE_POSTERS);
        assert_eq!(lexed.warnings[0].line, 5);
        let posters: Vec<_> = lexed.blocks.iter().filter(|b| b.block.is_poster).collect();
        assert_eq!(posters.len(), 1);
        assert_eq!(posters[0].block.lines, vec!["@group one"]);
    }

    #[test]
    fn doc_block_at_end_of_file_is_unknown() {
        let lexed = lex_ok("///desc\n");
        assert_eq!(lexed.blocks.len(), 1);
        assert_eq!(lexed.blocks[0].context.as_ref().unwrap().kind, ContextKind::Unknown);
    }

    #[test]
    fn stray_sigil_is_a_syntax_error() {
        let err = lex("fake", "///invalid\n$%^").unwrap_err();
        match err {
            Error::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unbalanced_braces_are_syntax_errors() {
        assert!(matches!(lex("a", "}\n"), Err(Error::Syntax { line: 1, .. })));
        assert!(matches!(lex("a", "@mixin m {\n"), Err(Error::Syntax { line: 1, .. })));
    }

    #[test]
    fn unterminated_explicit_poster_is_a_syntax_error() {
        assert!(matches!(lex("a", "////\n//// text\n$a: 1;\n"), Err(Error::Syntax { line: 1, .. })));
        assert!(matches!(lex("a", "////\n//// text\n"), Err(Error::Syntax { .. })));
    }

    #[test]
    fn strings_urls_and_interpolation_pass_the_scan() {
        let input = "$url: url(http://example.com/a.png);\n.a { content: \"$ } {\"; width: #{$w}; } // trailing }\n";
        assert!(lex("a", input).is_ok());
    }

    #[test]
    fn attribute_suffix_selector_passes_the_scan() {
        let input = "/// Link styles\n@mixin pdf-links {\n  a[href$=\".pdf\"] { color: red; }\n}\n";
        let lexed = lex_ok(input);
        let ctx = lexed.blocks[0].context.as_ref().unwrap();
        assert_eq!(ctx.kind, ContextKind::Mixin);
        assert_eq!(ctx.name, "pdf-links");
        assert!(lex("a", "a[title$=end] {}\n").is_ok());
    }

    #[test]
    fn dollar_interpolation_passes_the_scan() {
        assert!(lex("a", ".a { content: ${b}; }\n").is_ok());
    }
}
