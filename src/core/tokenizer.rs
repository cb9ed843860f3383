// src/core/tokenizer.rs

use crate::{
    constants::{ESCAPED_DOUBLE_QUOTE, ESCAPED_SINGLE_QUOTE, ESCAPED_SPACE},
    core::argument::Argument,
};
use std::iter::repeat_n;

/// The state of the tokenizer between two characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Outside,
    InSimple,
    InSingleQuote,
    InDoubleQuote,
}

/// True when the input has nothing that needs the state machine.
fn is_simple(typed: &str) -> bool {
    !typed.contains([' ', '\'', '"', '\\'])
}

/// Input with its escapes resolved, still able to point back at what was typed.
struct Unescaped<'a> {
    typed: &'a str,
    text: String,
    /// Offset in `typed` of every byte of `text`, plus the end.
    offsets: Vec<usize>,
}

impl Unescaped<'_> {
    /// The typed characters behind `text[start..end]`.
    fn source_of(&self, start: usize, end: usize) -> &str {
        match (self.offsets.get(start), self.offsets.get(end)) {
            (Some(&from), Some(&to)) => self.typed.get(from..to).unwrap_or_default(),
            _ => "",
        }
    }
}

/// Replaces backslash escapes with the characters they stand for. Escaped
/// delimiters become private-use placeholders so the state machine never
/// mistakes them for real ones. Unknown escapes are kept as typed.
fn substitute_escapes(typed: &str) -> Unescaped<'_> {
    let mut text = String::with_capacity(typed.len());
    let mut offsets = Vec::with_capacity(typed.len() + 1);
    let mut chars = typed.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let replacement = if c == '\\' {
            chars.peek().and_then(|&(_, next)| escape_for(next))
        } else {
            None
        };
        let resolved = match replacement {
            Some(r) => {
                chars.next();
                r
            }
            None => c,
        };
        offsets.extend(repeat_n(offset, resolved.len_utf8()));
        text.push(resolved);
    }
    offsets.push(typed.len());
    Unescaped {
        typed,
        text,
        offsets,
    }
}

/// What `\x` stands for, if it is a known escape.
fn escape_for(next: char) -> Option<char> {
    match next {
        '\\' => Some('\\'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        'v' => Some('\u{b}'),
        ' ' => Some(ESCAPED_SPACE),
        '\'' => Some(ESCAPED_SINGLE_QUOTE),
        '"' => Some(ESCAPED_DOUBLE_QUOTE),
        _ => None,
    }
}

/// Turns placeholders back into the literal characters they stand for.
fn restore_placeholders(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ESCAPED_SPACE => ' ',
            ESCAPED_SINGLE_QUOTE => '\'',
            ESCAPED_DOUBLE_QUOTE => '"',
            other => other,
        })
        .collect()
}

/// Splits typed input into arguments, keeping every character.
///
/// # Logic:
/// - Blank input yields a single empty argument, never an empty list.
/// - Input with no space, quote or backslash is one argument.
/// - Whitespace before a token becomes its prefix; an opening quote joins it.
/// - A closing quote becomes the suffix of the quoted token.
/// - Trailing whitespace is attached to the suffix of the last argument.
/// - An unterminated quote is flushed as-is at the end of input.
pub fn tokenize(typed: &str) -> Vec<Argument> {
    if typed.is_empty() {
        return vec![Argument::new("", "", "")];
    }
    if is_simple(typed) {
        return vec![Argument::new(typed, "", "")];
    }

    let unescaped = substitute_escapes(typed);
    let typed = unescaped.text.as_str();
    let mut args: Vec<Argument> = Vec::new();
    let mut mode = Mode::Outside;
    let mut start = 0usize;
    let mut prefix = String::new();

    for (i, c) in typed.char_indices() {
        let next = i + c.len_utf8();
        match mode {
            Mode::Outside => match c {
                '\'' | '"' => {
                    prefix = typed.get(start..next).unwrap_or_default().to_string();
                    mode = if c == '\'' {
                        Mode::InSingleQuote
                    } else {
                        Mode::InDoubleQuote
                    };
                    start = next;
                }
                ' ' => {}
                _ => {
                    prefix = typed.get(start..i).unwrap_or_default().to_string();
                    mode = Mode::InSimple;
                    start = i;
                }
            },
            Mode::InSimple => {
                // `xx'xx` stays one token: quotes only open at a token start.
                if c == ' ' {
                    let text = restore_placeholders(typed.get(start..i).unwrap_or_default());
                    let source = unescaped.source_of(start, i);
                    args.push(Argument::escaped(text, source, std::mem::take(&mut prefix), ""));
                    mode = Mode::Outside;
                    start = i;
                }
            }
            Mode::InSingleQuote | Mode::InDoubleQuote => {
                let closing = if mode == Mode::InSingleQuote { '\'' } else { '"' };
                if c == closing {
                    let text = restore_placeholders(typed.get(start..i).unwrap_or_default());
                    args.push(Argument::escaped(
                        text,
                        unescaped.source_of(start, i),
                        std::mem::take(&mut prefix),
                        closing.to_string(),
                    ));
                    mode = Mode::Outside;
                    start = next;
                }
            }
        }
    }

    let rest = typed.get(start..).unwrap_or_default();
    if mode == Mode::Outside {
        if !rest.is_empty() {
            match args.last_mut() {
                Some(last) => last.append_suffix(rest),
                None => args.push(Argument::new("", rest, "")),
            }
        }
    } else {
        let source = unescaped.source_of(start, typed.len());
        args.push(Argument::escaped(restore_placeholders(rest), source, prefix, ""));
    }

    log::trace!("Tokenized {:?} into {} argument(s)", typed, args.len());
    args
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(args: &[Argument]) -> Vec<(&str, &str, &str)> {
        args.iter()
            .map(|a| (a.prefix(), a.text(), a.suffix()))
            .collect()
    }

    fn joined(args: &[Argument]) -> String {
        args.iter().map(Argument::to_string).collect()
    }

    #[test]
    fn test_blank_input_yields_one_empty_argument() {
        let args = tokenize("");
        assert_eq!(parts(&args), vec![("", "", "")]);
    }

    #[test]
    fn test_simple_fast_path() {
        let args = tokenize("hello");
        assert_eq!(parts(&args), vec![("", "hello", "")]);

        let args = tokenize("--flag=x{y}");
        assert_eq!(args.len(), 1);
        assert_eq!(args[0].text(), "--flag=x{y}");
    }

    #[test]
    fn test_whitespace_becomes_prefix() {
        let args = tokenize("a   b");
        assert_eq!(parts(&args), vec![("", "a", ""), ("   ", "b", "")]);
        assert_eq!(joined(&args), "a   b");
    }

    #[test]
    fn test_trailing_whitespace_attaches_to_last_suffix() {
        let args = tokenize("a  ");
        assert_eq!(parts(&args), vec![("", "a", "  ")]);
        assert_eq!(joined(&args), "a  ");
    }

    #[test]
    fn test_only_whitespace_creates_empty_argument() {
        let args = tokenize("   ");
        assert_eq!(parts(&args), vec![("   ", "", "")]);
    }

    #[test]
    fn test_leading_whitespace() {
        let args = tokenize("  echo hi");
        assert_eq!(parts(&args), vec![("  ", "echo", ""), (" ", "hi", "")]);
    }

    #[test]
    fn test_single_quotes() {
        let args = tokenize("'a b' c");
        assert_eq!(parts(&args), vec![("'", "a b", "'"), (" ", "c", "")]);
        assert_eq!(joined(&args), "'a b' c");
    }

    #[test]
    fn test_double_quotes_with_prefix_space() {
        let args = tokenize("echo  \"x 'y'\" ");
        assert_eq!(
            parts(&args),
            vec![("", "echo", ""), ("  \"", "x 'y'", "\" ")]
        );
    }

    #[test]
    fn test_empty_quotes() {
        let args = tokenize("set ''");
        assert_eq!(parts(&args), vec![("", "set", ""), (" '", "", "'")]);
    }

    #[test]
    fn test_quote_inside_simple_token() {
        let args = tokenize("don't stop");
        assert_eq!(parts(&args), vec![("", "don't", ""), (" ", "stop", "")]);
    }

    #[test]
    fn test_unterminated_quote_is_flushed() {
        let args = tokenize("echo 'abc d");
        assert_eq!(parts(&args), vec![("", "echo", ""), (" '", "abc d", "")]);
    }

    #[test]
    fn test_escaped_delimiters() {
        let args = tokenize("a\\ b 'it\\'s' \\\"q\\\"");
        assert_eq!(
            parts(&args),
            vec![("", "a b", ""), (" '", "it's", "'"), (" ", "\"q\"", "")]
        );
    }

    #[test]
    fn test_escaped_input_round_trips() {
        // --- Setup ---
        let input = "cmd x\\ y 'it\\'s' \\\\n";

        // --- Execute ---
        let args = tokenize(input);

        // --- Assert ---
        assert_eq!(
            parts(&args),
            vec![("", "cmd", ""), (" ", "x y", ""), (" '", "it's", "'"), (" ", "\\n", "")]
        );
        assert_eq!(args[1].source(), "x\\ y");
        assert_eq!(args[2].source(), "it\\'s");
        assert_eq!(joined(&args), input);
    }

    #[test]
    fn test_control_escapes() {
        let args = tokenize("x\\ty \\\\n");
        assert_eq!(parts(&args), vec![("", "x\ty", ""), (" ", "\\n", "")]);
    }

    #[test]
    fn test_unknown_escape_is_kept() {
        let args = tokenize("a\\qb c");
        assert_eq!(args[0].text(), "a\\qb");
    }

    #[test]
    fn test_round_trip_on_plain_input() {
        for input in ["pref set foo", "  a  'b c'  d ", "x \"y\"", "echo"] {
            assert_eq!(joined(&tokenize(input)), input, "input: {:?}", input);
        }
    }

    #[test]
    fn test_multibyte_characters() {
        let args = tokenize("héllo wörld");
        assert_eq!(parts(&args), vec![("", "héllo", ""), (" ", "wörld", "")]);
    }
}
