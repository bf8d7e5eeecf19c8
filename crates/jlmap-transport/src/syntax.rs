//! Lightweight self-containment check for outgoing scripts.
//!
//! This is not a parser. It tracks string literals, comments and bracket
//! nesting, which is enough to catch the failures a broken template produces:
//! an unterminated string, an unclosed block or a stray closing bracket.
//! Regular expression literals are not recognised.

use jlmap_core::error::{JlMapError, Result};

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
}

pub fn check_balanced(script: &str) -> Result<()> {
    let mut state = State::Code;
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut chars = script.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match state {
            State::Code => match c {
                '\'' | '"' | '`' => state = State::Quoted(c),
                '/' => match chars.peek() {
                    Some((_, '/')) => {
                        chars.next();
                        state = State::LineComment;
                    }
                    Some((_, '*')) => {
                        chars.next();
                        state = State::BlockComment;
                    }
                    _ => {}
                },
                '(' | '[' | '{' => stack.push((c, pos)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, at)) => {
                            return Err(JlMapError::MalformedScript(format!(
                                "'{c}' at byte {pos} closes '{open}' opened at byte {at}"
                            )));
                        }
                        None => {
                            return Err(JlMapError::MalformedScript(format!(
                                "unmatched '{c}' at byte {pos}"
                            )));
                        }
                    }
                }
                _ => {}
            },
            State::Quoted(quote) => match c {
                '\\' => {
                    chars.next();
                }
                '\n' if quote != '`' => {
                    return Err(JlMapError::MalformedScript(format!(
                        "line break inside string literal at byte {pos}"
                    )));
                }
                c if c == quote => state = State::Code,
                _ => {}
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Code;
                }
            }
            State::BlockComment => {
                if c == '*' && matches!(chars.peek(), Some((_, '/'))) {
                    chars.next();
                    state = State::Code;
                }
            }
        }
    }

    match state {
        State::Quoted(quote) => Err(JlMapError::MalformedScript(format!(
            "unterminated {quote} string literal"
        ))),
        State::BlockComment => Err(JlMapError::MalformedScript(
            "unterminated block comment".into(),
        )),
        State::Code | State::LineComment => match stack.last() {
            Some((open, at)) => Err(JlMapError::MalformedScript(format!(
                "'{open}' opened at byte {at} is never closed"
            ))),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed_scripts() {
        for script in [
            "",
            "this.map.setView([1.000000, 2.000000], 3);",
            "var c = L.circle([0, 0], {radius: 1.000000, color: '#3388ff'});",
            "f('it\\'s (not) a bracket');",
            "// callback start\nc.on('click', (e) => g(e));\n// callback end",
            "/* { */ x();",
            "g(\"[\", `{${a}`);",
        ] {
            assert!(check_balanced(script).is_ok(), "{script}");
        }
    }

    #[test]
    fn test_rejects_malformed_scripts() {
        for script in [
            "f('unterminated);",
            "f(\"x);",
            "var o = {a: 1;",
            "f(1));",
            "f([1, 2)];",
            "/* never closed",
            "f('line\nbreak');",
        ] {
            assert!(
                matches!(check_balanced(script), Err(JlMapError::MalformedScript(_))),
                "{script}"
            );
        }
    }
}
