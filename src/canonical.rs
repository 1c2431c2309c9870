//! Test-case input canonicalization
//!
//! Test inputs are written for humans, e.g. `nums = [2,7,11,15], target = 9`.
//! Two forms are derived from them:
//!
//! - the stdin form, a flat token stream where every list is preceded by its
//!   length (`4 2 7 11 15 9`), read by compiled solutions with `cin`/`Scanner`;
//! - the binding form, one `name = value` assignment per line, executed by the
//!   interpreted harness before calling the submitted function.
//!
//! Supported grammar:
//!
//! ```text
//! input := item ( ',' item )*
//! item  := [ IDENT '=' ] value
//! value := list | STRING | ATOM
//! list  := '[' [ value ( ',' value )* ] ']'
//! ```
//!
//! Lists may nest; each nested list gets its own length prefix. Quoted strings
//! keep their contents (commas included) as a single token. Anything outside
//! the grammar is passed through token by token.

use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("unbalanced `{0}` in test input")]
    UnbalancedBracket(char),
    #[error("unterminated string literal in test input")]
    UnterminatedString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Ident(&'a str),
    Equals,
    Comma,
    Open,
    Close,
    /// String literal contents, quotes removed
    Str(&'a str),
    Atom(&'a str),
}

#[derive(Debug, Clone, Copy)]
struct Spanned<'a> {
    token: Token<'a>,
    start: usize,
    end: usize,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | ',' | '=' | '\'' | '"')
}

fn tokenize(input: &str) -> Result<Vec<Spanned<'_>>, CanonicalError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '[' | ']' | ',' => {
                chars.next();
                match c {
                    '[' => Token::Open,
                    ']' => Token::Close,
                    _ => Token::Comma,
                }
            }
            '=' => {
                chars.next();
                // `==` is a value, not an assignment
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    Token::Atom(&input[start..start + 2])
                } else {
                    Token::Equals
                }
            }
            '\'' | '"' => {
                chars.next();
                let mut escaped = false;
                let mut close = None;
                for (idx, ch) in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == c {
                        close = Some(idx);
                        break;
                    }
                }
                let close = close.ok_or(CanonicalError::UnterminatedString)?;
                Token::Str(&input[start + 1..close])
            }
            c if is_ident_start(c) => {
                let mut end = start;
                while let Some(&(idx, ch)) = chars.peek() {
                    if !is_ident_continue(ch) {
                        break;
                    }
                    end = idx + ch.len_utf8();
                    chars.next();
                }
                Token::Ident(&input[start..end])
            }
            _ => {
                let mut end = start;
                while let Some(&(idx, ch)) = chars.peek() {
                    if is_delimiter(ch) {
                        break;
                    }
                    end = idx + ch.len_utf8();
                    chars.next();
                }
                Token::Atom(&input[start..end])
            }
        };

        let end = chars.peek().map_or(input.len(), |&(idx, _)| idx);
        tokens.push(Spanned { token, start, end });
    }

    Ok(tokens)
}

/// Converts a test input into the size-prefixed stdin token stream
///
/// `nums = [2,7,11,15], target = 9` becomes `4 2 7 11 15 9`.
pub fn to_stdin_tokens(input: &str) -> Result<String, CanonicalError> {
    let tokens = tokenize(input)?;
    let mut words: Vec<String> = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        match tokens[idx].token {
            Token::Ident(_) if is_assignment(&tokens, idx) => idx += 2,
            Token::Equals | Token::Comma => idx += 1,
            Token::Open => {
                let (list_words, next) = flatten_list(&tokens, idx)?;
                words.extend(list_words);
                idx = next;
            }
            Token::Close => return Err(CanonicalError::UnbalancedBracket(']')),
            Token::Ident(text) | Token::Str(text) | Token::Atom(text) => {
                words.push(text.to_string());
                idx += 1;
            }
        }
    }

    Ok(collapse_whitespace(&words.join(" ")))
}

fn is_assignment(tokens: &[Spanned<'_>], idx: usize) -> bool {
    matches!(tokens.get(idx).map(|t| t.token), Some(Token::Ident(_)))
        && matches!(tokens.get(idx + 1).map(|t| t.token), Some(Token::Equals))
}

/// Flattens the list opening at `open`, returns its words and the index past its `]`
fn flatten_list(
    tokens: &[Spanned<'_>],
    open: usize,
) -> Result<(Vec<String>, usize), CanonicalError> {
    let mut elements: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut idx = open + 1;

    loop {
        let Some(spanned) = tokens.get(idx) else {
            return Err(CanonicalError::UnbalancedBracket('['));
        };
        match spanned.token {
            Token::Close => {
                idx += 1;
                break;
            }
            Token::Comma => {
                if !current.is_empty() {
                    elements.push(std::mem::take(&mut current));
                }
                idx += 1;
            }
            Token::Open => {
                let (inner, next) = flatten_list(tokens, idx)?;
                current.extend(inner);
                idx = next;
            }
            Token::Equals => idx += 1,
            Token::Ident(text) | Token::Str(text) | Token::Atom(text) => {
                current.push(text.to_string());
                idx += 1;
            }
        }
    }
    if !current.is_empty() {
        elements.push(current);
    }

    let mut words = Vec::with_capacity(elements.len() + 1);
    words.push(elements.len().to_string());
    words.extend(elements.into_iter().flatten());
    Ok((words, idx))
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One `name = value` statement of the binding form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: Option<String>,
    /// Right-hand side exactly as written, surrounding whitespace trimmed
    pub value: String,
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} = {}", self.value),
            None => f.write_str(&self.value),
        }
    }
}

/// Splits a test input into its assignments
///
/// A top-level comma starts a new assignment only when it is followed by
/// `IDENT =`, so commas inside lists and strings stay in their value.
pub fn to_bindings(input: &str) -> Result<Vec<Binding>, CanonicalError> {
    let tokens = tokenize(input)?;
    let mut depth = 0usize;
    let mut cuts = Vec::new();

    for (idx, spanned) in tokens.iter().enumerate() {
        match spanned.token {
            Token::Open => depth += 1,
            Token::Close => {
                depth = depth
                    .checked_sub(1)
                    .ok_or(CanonicalError::UnbalancedBracket(']'))?;
            }
            Token::Comma if depth == 0 && is_assignment(&tokens, idx + 1) => {
                cuts.push(idx);
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err(CanonicalError::UnbalancedBracket('['));
    }

    let mut bindings = Vec::new();
    let mut piece_start = 0;
    for piece_end in cuts.into_iter().chain(std::iter::once(tokens.len())) {
        let piece = trim_commas(&tokens[piece_start..piece_end]);
        piece_start = piece_end + 1;
        if piece.is_empty() {
            continue;
        }

        let value_end = piece[piece.len() - 1].end;
        let binding = match piece {
            [
                Spanned {
                    token: Token::Ident(name),
                    ..
                },
                equals @ Spanned {
                    token: Token::Equals,
                    ..
                },
                ..,
            ] => Binding {
                name: Some(name.to_string()),
                value: input[equals.end..value_end].trim().to_string(),
            },
            _ => Binding {
                name: None,
                value: input[piece[0].start..value_end].trim().to_string(),
            },
        };
        bindings.push(binding);
    }

    Ok(bindings)
}

/// Drops stray top-level commas around a piece, as in `a = 1,` or `a = 1,, b = 2`
fn trim_commas<'a, 's>(mut piece: &'a [Spanned<'s>]) -> &'a [Spanned<'s>] {
    while let [Spanned { token: Token::Comma, .. }, rest @ ..] = piece {
        piece = rest;
    }
    while let [rest @ .., Spanned { token: Token::Comma, .. }] = piece {
        piece = rest;
    }
    piece
}

/// The binding form as source text, one assignment per line
pub fn to_binding_lines(input: &str) -> Result<String, CanonicalError> {
    let lines: Vec<String> = to_bindings(input)?
        .iter()
        .map(ToString::to_string)
        .collect();
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stdin_two_sum() {
        assert_eq!(
            to_stdin_tokens("nums = [2,7,11,15], target = 9").unwrap(),
            "4 2 7 11 15 9"
        );
    }

    #[test]
    fn test_stdin_strips_quotes_and_spacing() {
        assert_eq!(
            to_stdin_tokens(r#"s = ["h", 'e' , "l","l","o"]"#).unwrap(),
            "5 h e l l o"
        );
        assert_eq!(to_stdin_tokens("  n =   5 ,  k=2 ").unwrap(), "5 2");
    }

    #[test]
    fn test_stdin_empty_and_sparse_lists() {
        assert_eq!(to_stdin_tokens("nums = []").unwrap(), "0");
        assert_eq!(to_stdin_tokens("nums = [1,,2, ]").unwrap(), "2 1 2");
    }

    #[test]
    fn test_stdin_nested_lists_get_their_own_sizes() {
        assert_eq!(
            to_stdin_tokens("grid = [[1,2],[3,4,5]], k = 1").unwrap(),
            "2 2 1 2 3 3 4 5 1"
        );
    }

    #[test]
    fn test_stdin_string_keeps_embedded_comma() {
        assert_eq!(to_stdin_tokens(r#"words = ["a,b", "c"]"#).unwrap(), "2 a,b c");
    }

    #[test]
    fn test_stdin_plain_tokens_pass_through() {
        assert_eq!(to_stdin_tokens("3 4 5").unwrap(), "3 4 5");
        assert_eq!(to_stdin_tokens("-1, 2.5, true").unwrap(), "-1 2.5 true");
    }

    #[test]
    fn test_stdin_rejects_unbalanced_input() {
        assert_eq!(
            to_stdin_tokens("nums = [1,2"),
            Err(CanonicalError::UnbalancedBracket('['))
        );
        assert_eq!(
            to_stdin_tokens("nums = 1]"),
            Err(CanonicalError::UnbalancedBracket(']'))
        );
        assert_eq!(
            to_stdin_tokens("s = \"abc"),
            Err(CanonicalError::UnterminatedString)
        );
    }

    #[test]
    fn test_bindings_split_on_assignments_only() {
        let bindings = to_bindings("nums = [2,7,11,15], target = 9").unwrap();
        assert_eq!(
            bindings,
            vec![
                Binding {
                    name: Some("nums".to_string()),
                    value: "[2,7,11,15]".to_string(),
                },
                Binding {
                    name: Some("target".to_string()),
                    value: "9".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_binding_lines_preserve_values() {
        assert_eq!(
            to_binding_lines("a = 1, b = 'x, y', c=None").unwrap(),
            "a = 1\nb = 'x, y'\nc = None"
        );
        assert_eq!(
            to_binding_lines(r#"s = ["h","e","l","l","o"]"#).unwrap(),
            r#"s = ["h","e","l","l","o"]"#
        );
    }

    #[test]
    fn test_bindings_without_names() {
        let bindings = to_bindings("[1, 2, 3]").unwrap();
        assert_eq!(
            bindings,
            vec![Binding {
                name: None,
                value: "[1, 2, 3]".to_string(),
            }]
        );
        assert_eq!(to_binding_lines("").unwrap(), "");
    }

    #[test]
    fn test_bindings_do_not_treat_equality_as_assignment() {
        let bindings = to_bindings("flag = x == y").unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].value, "x == y");
    }

    #[test]
    fn test_stray_commas_are_skipped() {
        assert_eq!(to_stdin_tokens("nums = [1,2],").unwrap(), "2 1 2");
        assert_eq!(to_stdin_tokens("a = 1,, b = 2").unwrap(), "1 2");
        assert_eq!(to_stdin_tokens("nums = [1,,2,]").unwrap(), "2 1 2");

        assert_eq!(to_binding_lines("nums = [1,2],").unwrap(), "nums = [1,2]");
        assert_eq!(to_binding_lines("a = 1,, b = 2").unwrap(), "a = 1\nb = 2");
        assert_eq!(to_binding_lines(", a = 1").unwrap(), "a = 1");
        assert!(to_bindings(",").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_name_is_not_an_assignment() {
        let bindings = to_bindings("a = 1, b").unwrap();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].value, "1, b");
    }

    #[test]
    fn test_canonicalizing_leaves_input_untouched() {
        let input = String::from("nums = [3,3], target = 6");
        let before = input.clone();
        let _ = to_stdin_tokens(&input).unwrap();
        let _ = to_bindings(&input).unwrap();
        assert_eq!(input, before);
    }
}
