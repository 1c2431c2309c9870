use super::Value;

/// Parses a Python literal expression: numbers, strings in either quote style,
/// `None`/`True`/`False`, lists, tuples, dicts and sets
///
/// Returns `None` if the text is not a single literal.
pub fn parse(text: &str) -> Option<Value> {
    let mut parser = LiteralParser {
        chars: text.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    parser.at_end().then_some(value)
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
}

impl LiteralParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_whitespace();
        match self.peek()? {
            '[' => {
                self.pos += 1;
                self.sequence(']').map(Value::List)
            }
            '(' => {
                self.pos += 1;
                self.parenthesized()
            }
            '{' => {
                self.pos += 1;
                self.braced()
            }
            '\'' | '"' => self.string(false),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.word(),
            _ => None,
        }
    }

    /// Comma separated values up to `close`, trailing comma allowed
    fn sequence(&mut self, close: char) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(items);
            }
            items.push(self.value()?);
            if self.eat(close) {
                return Some(items);
            }
            if !self.eat(',') {
                return None;
            }
        }
    }

    fn parenthesized(&mut self) -> Option<Value> {
        if self.eat(')') {
            return Some(Value::Tuple(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(')') {
            return Some(first);
        }
        if !self.eat(',') {
            return None;
        }
        let mut items = vec![first];
        items.extend(self.sequence(')')?);
        Some(Value::Tuple(items))
    }

    fn braced(&mut self) -> Option<Value> {
        if self.eat('}') {
            return Some(Value::Dict(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(':') {
            let mut entries = vec![(first, self.value()?)];
            loop {
                if self.eat('}') {
                    return Some(Value::Dict(entries));
                }
                if !self.eat(',') {
                    return None;
                }
                if self.eat('}') {
                    return Some(Value::Dict(entries));
                }
                let key = self.value()?;
                if !self.eat(':') {
                    return None;
                }
                entries.push((key, self.value()?));
            }
        }

        let mut items = vec![first];
        if !self.eat('}') {
            if !self.eat(',') {
                return None;
            }
            items.extend(self.sequence('}')?);
        }
        Some(Value::Set(items))
    }

    fn word(&mut self) -> Option<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        match word.as_str() {
            "None" => Some(Value::None),
            "True" => Some(Value::Bool(true)),
            "False" => Some(Value::Bool(false)),
            prefix if matches!(self.peek(), Some('\'' | '"')) => {
                let lower = prefix.to_ascii_lowercase();
                match lower.as_str() {
                    "u" | "b" => self.string(false),
                    "r" | "br" | "rb" => self.string(true),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn string(&mut self, raw: bool) -> Option<Value> {
        let quote = self.bump()?;
        let mut out = String::new();
        loop {
            let c = self.bump()?;
            if c == quote {
                return Some(Value::Str(out));
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            let escaped = self.bump()?;
            if raw {
                out.push('\\');
                out.push(escaped);
                continue;
            }
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                '\\' | '\'' | '"' => out.push(escaped),
                'x' => out.push(self.code_point(2)?),
                'u' => out.push(self.code_point(4)?),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn code_point(&mut self, digits: usize) -> Option<char> {
        let end = self.pos.checked_add(digits)?;
        let hex: String = self.chars.get(self.pos..end)?.iter().collect();
        self.pos = end;
        char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
            self.skip_whitespace();
        }
        let digits_start = self.pos;
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    if matches!(self.chars.get(self.pos + 1), Some('-' | '+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
            self.pos += 1;
        }
        if self.pos == digits_start {
            return None;
        }

        let negative = self.chars[start] == '-';
        let digits: String = self.chars[digits_start..self.pos]
            .iter()
            .filter(|c| **c != '_')
            .collect();
        let signed = if negative {
            format!("-{digits}")
        } else {
            digits
        };

        if !is_float {
            if let Ok(int) = signed.parse::<i128>() {
                return Some(Value::Int(int));
            }
        }
        signed.parse::<f64>().ok().map(Value::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(parse("42"), Some(Value::Int(42)));
        assert_eq!(parse("-7"), Some(Value::Int(-7)));
        assert_eq!(parse("2.5"), Some(Value::Float(2.5)));
        assert_eq!(parse("1e3"), Some(Value::Float(1000.0)));
        assert_eq!(parse("None"), Some(Value::None));
        assert_eq!(parse("True"), Some(Value::Bool(true)));
        assert_eq!(parse("'it\\'s'"), Some(Value::Str("it's".to_string())));
    }

    #[test]
    fn test_containers() {
        assert_eq!(
            parse("['h', 'i']"),
            Some(Value::List(vec![
                Value::Str("h".to_string()),
                Value::Str("i".to_string()),
            ]))
        );
        assert_eq!(
            parse("(1, 2,)"),
            Some(Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(parse("(3)"), Some(Value::Int(3)));
        assert_eq!(
            parse("{'a': 1}"),
            Some(Value::Dict(vec![(Value::Str("a".to_string()), Value::Int(1))]))
        );
        assert_eq!(
            parse("{1, 2}"),
            Some(Value::Set(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(parse("{}"), Some(Value::Dict(Vec::new())));
    }

    #[test]
    fn test_rejects_non_literals() {
        assert_eq!(parse("hello"), None);
        assert_eq!(parse("[1, 2"), None);
        assert_eq!(parse("1 2"), None);
        assert_eq!(parse("f(1)"), None);
        assert_eq!(parse(""), None);
    }
}
