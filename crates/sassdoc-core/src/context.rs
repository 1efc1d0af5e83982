//! Context detection — which declaration follows a doc comment.
//!
//! Purely syntactic: only the declaration header is recognised, parameter
//! lists and bodies are cut out by bracket matching. Anything that does not
//! look like a declaration becomes an `unknown` context; detection never fails.

use crate::model::{Context, ContextKind, LineRange, Parameter, Scope};
use regex::Regex;
use std::sync::LazyLock;

static RE_CALLABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*@(function|mixin)\s+([\w-]+)").unwrap());

static RE_VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\$([\w-]+)\s*:").unwrap());

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*%([\w-]+)").unwrap());

static RE_FLAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*!(default|global)\b").unwrap());

/// Detect the context for the comment that ends right before `lines[index]`.
///
/// The declaration header must start on `lines[index]`; a blank line there
/// (or end of input) means the comment documents nothing.
pub fn detect(lines: &[&str], index: usize) -> Context {
    let line_no = index + 1;
    let Some(first) = lines.get(index) else {
        return Context::unknown(line_no);
    };
    if first.trim().is_empty() {
        return Context::unknown(line_no);
    }

    let declaration = || lines[index..declaration_end(lines, index)].join("\n");

    let detected = if let Some(caps) = RE_CALLABLE.captures(first) {
        let kind = if &caps[1] == "function" {
            ContextKind::Function
        } else {
            ContextKind::Mixin
        };
        callable(kind, &caps[2], &declaration(), caps.get(0).map_or(0, |m| m.end()), line_no)
    } else if let Some(caps) = RE_VARIABLE.captures(first) {
        // Through the first line ending the statement, never past a blank line.
        let span_end = lines[index..]
            .iter()
            .position(|l| l.trim().is_empty() || l.trim_end().ends_with(';'))
            .map_or(lines.len(), |p| {
                let stop = lines[index + p];
                if stop.trim().is_empty() { index + p } else { index + p + 1 }
            });
        let span = lines[index..span_end].join("\n");
        variable(&caps[1], &span, caps.get(0).map_or(0, |m| m.end()), line_no)
    } else if let Some(caps) = RE_PLACEHOLDER.captures(first) {
        let header_end = caps.get(0).map_or(0, |m| m.end());
        body(&declaration(), header_end, line_no).map(|(code, end)| Context {
            kind: ContextKind::Placeholder,
            name: caps[1].to_string(),
            line: LineRange {
                start: line_no,
                end,
            },
            parameters: Vec::new(),
            value: None,
            scope: None,
            code: Some(code),
        })
    } else {
        None
    };

    detected.unwrap_or_else(|| Context::unknown(line_no))
}

// -- Declarations -------------------------------------------------------------

fn callable(kind: ContextKind, name: &str, rest: &str, header_end: usize, line_no: usize) -> Option<Context> {
    let after = &rest[header_end..];
    let trimmed = after.trim_start();
    let mut cursor = header_end + (after.len() - trimmed.len());

    let mut parameters = Vec::new();
    if trimmed.starts_with('(') {
        let close = find_matching(rest, cursor, '(', ')')?;
        parameters = parse_parameters(&rest[cursor + 1..close]);
        cursor = close + 1;
    } else if kind == ContextKind::Function {
        // Functions always declare a parameter list, even an empty one.
        return None;
    }

    let (code, end) = body(rest, cursor, line_no)?;
    Some(Context {
        kind,
        name: name.to_string(),
        line: LineRange {
            start: line_no,
            end,
        },
        parameters,
        value: None,
        scope: None,
        code: Some(code),
    })
}

fn variable(name: &str, span: &str, header_end: usize, line_no: usize) -> Option<Context> {
    let after = &span[header_end..];
    let raw = match find_top_level(after, ';') {
        Some(pos) => &after[..pos],
        None => after,
    };
    let consumed = header_end + raw.len();

    let mut scope = if name.starts_with('_') || name.starts_with('-') {
        Scope::Private
    } else {
        Scope::Public
    };
    for caps in RE_FLAG.captures_iter(raw) {
        scope = match &caps[1] {
            "global" => Scope::Global,
            _ => Scope::Default,
        };
    }

    let value = RE_FLAG.replace_all(raw, "").trim().to_string();
    if value.is_empty() {
        return None;
    }

    Some(Context {
        kind: ContextKind::Variable,
        name: name.to_string(),
        line: LineRange {
            start: line_no,
            end: line_no + span[..consumed].matches('\n').count(),
        },
        parameters: Vec::new(),
        value: Some(value),
        scope: Some(scope),
        code: None,
    })
}

/// Body of the first `{ ... }` at or after `from`, and the line it closes on.
///
/// Only whitespace may stand between `from` and the opening brace.
fn body(rest: &str, from: usize, line_no: usize) -> Option<(String, usize)> {
    let after = &rest[from..];
    let trimmed = after.trim_start();
    if !trimmed.starts_with('{') {
        return None;
    }
    let open = from + (after.len() - trimmed.len());
    let close = find_matching(rest, open, '{', '}')?;
    let code = rest[open + 1..close].trim_matches('\n').to_string();
    let end = line_no + rest[..close].matches('\n').count();
    Some((code, end))
}

/// Exclusive end of the lines a callable or placeholder declaration spans:
/// through the line closing its first `{`, or the line of a `;` met before
/// any `{`.
fn declaration_end(lines: &[&str], index: usize) -> usize {
    let mut depth = 0usize;
    let mut opened = false;
    let mut in_comment = false;
    for (offset, line) in lines[index..].iter().enumerate() {
        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if in_comment {
                if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    in_comment = false;
                    i += 1;
                }
                i += 1;
                continue;
            }
            match bytes[i] {
                b'"' | b'\'' => i = skip_string(bytes, i),
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    in_comment = true;
                    i += 1;
                }
                b'/' if starts_comment(bytes, i) => break,
                b'{' => {
                    depth += 1;
                    opened = true;
                }
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if opened && depth == 0 {
                        return index + offset + 1;
                    }
                }
                b';' if !opened => return index + offset + 1,
                _ => {}
            }
            i += 1;
        }
    }
    lines.len()
}

// -- Parameter lists ----------------------------------------------------------

/// Split `$a, $b: 10px, $rest...` into parameters.
pub fn parse_parameters(list: &str) -> Vec<Parameter> {
    split_top_level(list, ',')
        .into_iter()
        .filter_map(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            let (name, default) = match raw.split_once(':') {
                Some((n, d)) => (n.trim(), Some(d.trim().to_string())),
                None => (raw, None),
            };
            let (name, rest) = match name.strip_suffix("...") {
                Some(n) => (n, true),
                None => (name, false),
            };
            Some(Parameter {
                name: name.trim_start_matches('$').to_string(),
                default,
                rest,
            })
        })
        .collect()
}

// -- Bracket matching ---------------------------------------------------------

/// Byte offset of the bracket closing the one at `open`.
///
/// Strings and comments are skipped; all delimiters are ASCII so byte offsets
/// always fall on char boundaries.
fn find_matching(text: &str, open: usize, open_ch: char, close_ch: char) -> Option<usize> {
    let bytes = text.as_bytes();
    let (open_b, close_b) = (open_ch as u8, close_ch as u8);
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'/' if starts_comment(bytes, i) => i = skip_comment(bytes, i),
            b if b == open_b => depth += 1,
            b if b == close_b => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Offset of the first `sep` outside strings, comments and brackets.
fn find_top_level(text: &str, sep: char) -> Option<usize> {
    let bytes = text.as_bytes();
    let sep = sep as u8;
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'/' if starts_comment(bytes, i) => i = skip_comment(bytes, i),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b if b == sep && depth == 0 => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the quote closing the string opened at `start`.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

/// `//` at a token boundary (so `url(http://…)` is left alone), or `/*`.
fn starts_comment(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i + 1) {
        Some(b'*') => true,
        Some(b'/') => i == 0 || bytes[i - 1].is_ascii_whitespace() || matches!(bytes[i - 1], b';' | b'{' | b'}'),
        _ => false,
    }
}

/// Index of the last byte of the comment starting at `start`.
fn skip_comment(bytes: &[u8], start: usize) -> usize {
    if bytes[start + 1] == b'*' {
        let mut i = start + 2;
        while i + 1 < bytes.len() {
            if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                return i + 1;
            }
            i += 1;
        }
        bytes.len()
    } else {
        bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(bytes.len(), |p| start + p - 1)
    }
}

fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(pos) = find_top_level(rest, sep) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + sep.len_utf8()..];
    }
    parts.push(rest);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect_str(input: &str) -> Context {
        let lines: Vec<&str> = input.lines().collect();
        detect(&lines, 0)
    }

    #[test]
    fn detects_function_with_parameters() {
        let ctx = detect_str("@function rem($px, $base: 16px) {\n  @return $px / $base * 1rem;\n}");
        assert_eq!(ctx.kind, ContextKind::Function);
        assert_eq!(ctx.name, "rem");
        assert_eq!(ctx.parameters.len(), 2);
        assert_eq!(ctx.parameters[1].name, "base");
        assert_eq!(ctx.parameters[1].default.as_deref(), Some("16px"));
        assert_eq!(ctx.code.as_deref(), Some("  @return $px / $base * 1rem;"));
        assert_eq!(ctx.line, LineRange { start: 1, end: 3 });
    }

    #[test]
    fn detects_one_line_function() {
        let ctx = detect_str("@function fail(){}");
        assert_eq!(ctx.kind, ContextKind::Function);
        assert_eq!(ctx.name, "fail");
        assert!(ctx.parameters.is_empty());
        assert_eq!(ctx.code.as_deref(), Some(""));
    }

    #[test]
    fn detects_mixin_without_parameters() {
        let ctx = detect_str("  @mixin clearfix {\n  &::after { clear: both; }\n}");
        assert_eq!(ctx.kind, ContextKind::Mixin);
        assert_eq!(ctx.name, "clearfix");
        assert!(ctx.parameters.is_empty());
        assert_eq!(ctx.line.end, 3);
    }

    #[test]
    fn nested_defaults_and_rest_parameter() {
        let ctx = detect_str("@mixin m($map: (a: 1, b: (2, 3)), $args...) {}");
        assert_eq!(ctx.parameters.len(), 2);
        assert_eq!(ctx.parameters[0].default.as_deref(), Some("(a: 1, b: (2, 3))"));
        assert_eq!(ctx.parameters[1].name, "args");
        assert!(ctx.parameters[1].rest);
    }

    #[test]
    fn parameter_list_spanning_lines() {
        let ctx = detect_str("@mixin m(\n  $a,\n  $b: \")\"\n) {\n}");
        assert_eq!(ctx.kind, ContextKind::Mixin);
        assert_eq!(ctx.parameters.len(), 2);
        assert_eq!(ctx.parameters[1].default.as_deref(), Some("\")\""));
    }

    #[test]
    fn detects_variable_with_flags() {
        let ctx = detect_str("$base-font-size: 16px !default;");
        assert_eq!(ctx.kind, ContextKind::Variable);
        assert_eq!(ctx.name, "base-font-size");
        assert_eq!(ctx.value.as_deref(), Some("16px"));
        assert_eq!(ctx.scope, Some(Scope::Default));
    }

    #[test]
    fn detects_multiline_map_variable() {
        let ctx = detect_str("$_breakpoints: (\n  small: 320px,\n  large: 1024px\n);");
        assert_eq!(ctx.kind, ContextKind::Variable);
        assert_eq!(ctx.scope, Some(Scope::Private));
        assert_eq!(ctx.line.end, 4);
        assert!(ctx.value.as_deref().unwrap().contains("large: 1024px"));
    }

    #[test]
    fn body_ignores_braces_in_comments_and_strings() {
        let ctx = detect_str("@mixin m {\n  // don't { count this\n  content: \"}\";\n}\n.after {}");
        assert_eq!(ctx.kind, ContextKind::Mixin);
        assert_eq!(ctx.line.end, 4);
    }

    #[test]
    fn detects_placeholder() {
        let ctx = detect_str("%visually-hidden {\n  clip: rect(0 0 0 0);\n}");
        assert_eq!(ctx.kind, ContextKind::Placeholder);
        assert_eq!(ctx.name, "visually-hidden");
    }

    #[test]
    fn malformed_declarations_are_unknown() {
        assert_eq!(detect_str("@function (").kind, ContextKind::Unknown);
        assert_eq!(detect_str("@function missing-parens {}").kind, ContextKind::Unknown);
        assert_eq!(detect_str("@mixin open($a {").kind, ContextKind::Unknown);
        assert_eq!(detect_str("$empty: ;").kind, ContextKind::Unknown);
        assert_eq!(detect_str(".selector { color: red; }").kind, ContextKind::Unknown);
    }

    #[test]
    fn blank_line_or_end_means_unknown() {
        let lines = vec!["", "@function f() {}"];
        assert_eq!(detect(&lines, 0).kind, ContextKind::Unknown);
        assert_eq!(detect(&lines, 2).kind, ContextKind::Unknown);
    }

    #[test]
    fn declaration_span_stops_at_closing_brace() {
        let lines = vec![
            "@mixin a($x) {",
            "  content: '}';",
            "  .b { c: d; }",
            "}",
            "",
            "@mixin e {}",
        ];
        assert_eq!(declaration_end(&lines, 0), 4);
        assert_eq!(declaration_end(&lines, 5), 6);
        assert_eq!(declaration_end(&["@include x;", "$a: 1;"], 0), 1);
        assert_eq!(detect(&lines, 0).code.as_deref(), Some("  content: '}';\n  .b { c: d; }"));
    }

    #[test]
    fn variable_span_ends_with_its_statement() {
        let ctx = detect_str("$a: 1;\n$b: 2;\n$c: 3;");
        assert_eq!(ctx.value.as_deref(), Some("1"));
        assert_eq!(ctx.line, LineRange { start: 1, end: 1 });
    }
}
