mod literal;

/// A structured output value
///
/// Equality follows Python's rules, since expected outputs are authored as
/// Python literals: `1 == 1.0 == True`, lists never equal tuples, and dict or
/// set equality ignores ordering.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
}

impl Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i128> {
        match self {
            Value::Bool(b) => Some(i128::from(*b)),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.iter().any(|(other_key, other_value)| {
                            key == other_key && value == other_value
                        })
                    })
            }
            _ => match (self.as_int(), other.as_int()) {
                (Some(a), Some(b)) => a == b,
                _ => match (self.as_number(), other.as_number()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                },
            },
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::None,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Int(i128::from(u))
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Dict(
                map.into_iter()
                    .map(|(key, value)| (Value::Str(key), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Reduces an output string: JSON first, then a Python literal, then the trimmed text as a string
///
/// A bare `fl` printed by a stdin program and the JSON string `"fl"` reduce
/// to the same value.
pub fn normalize(output: &str) -> Value {
    let trimmed = output.trim();
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Value::from(json);
    }
    if let Some(value) = literal::parse(trimmed) {
        return value;
    }
    Value::Str(trimmed.to_string())
}

/// Decides whether the actual output matches the expected one
///
/// Both sides are normalized independently and compared structurally.
/// [`Value`] equality is total, so every pair has a structural answer.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    normalize(actual) == normalize(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflexive() {
        for output in ["[0,1]", "hello world", "{'a': [1, 2]}", "3.5", "", "None"] {
            assert!(outputs_match(output, output), "{output:?}");
        }
    }

    #[test]
    fn test_whitespace_insensitive_structure() {
        assert!(outputs_match("[0, 1]", "[0,1]"));
        assert!(outputs_match("  [0,1]\n", "[0,1]"));
    }

    #[test]
    fn test_quote_style_insensitive() {
        assert!(outputs_match("['a']", r#"["a"]"#));
        assert!(outputs_match(r#"["h","e","l","l","o"]"#, "['h','e','l','l','o']"));
    }

    #[test]
    fn test_symmetric() {
        let pairs = [("[0,1]", "[1,0]"), ("['a']", r#"["a"]"#), ("true", "True")];
        for (a, b) in pairs {
            assert_eq!(outputs_match(a, b), outputs_match(b, a));
        }
    }

    #[test]
    fn test_structurally_different() {
        assert!(!outputs_match("[0,1]", "[1,0]"));
        assert!(!outputs_match("[1,2]", "(1,2)"));
        assert!(!outputs_match("1", "'1'"));
    }

    #[test]
    fn test_python_and_json_literals_agree() {
        assert!(outputs_match("true", "True"));
        assert!(outputs_match("null", "None"));
        assert!(outputs_match("1", "1.0"));
        assert!(outputs_match(r#"{"b": 2, "a": 1}"#, "{'a': 1, 'b': 2}"));
    }

    #[test]
    fn test_plain_text_compares_verbatim() {
        assert!(outputs_match("hello world", " hello world "));
        assert!(!outputs_match("hello world", "helloworld"));
    }

    #[test]
    fn test_bare_text_equals_quoted_string() {
        assert!(outputs_match("fl", "\"fl\""));
        assert!(outputs_match("hello", "'hello'"));
        assert!(outputs_match("\"fl\"\n", "fl"));
        assert!(!outputs_match("fl", "\"flower\""));
    }

    #[test]
    fn test_unparseable_text_against_structure() {
        assert_eq!(normalize("[a, b]"), Value::Str("[a, b]".to_string()));
        assert!(!outputs_match("[a, b]", "['a','b']"));
        assert!(!outputs_match("True story", "True"));
    }
}
