//! Parser for the delimited text format used to encode arrays and maps in a
//! single environment variable.
//!
//! ```text
//! one, "two, three", 'it\'s'       -> ["one", "two, three", "it's"]
//! host:localhost, "port":"8080"    -> {"host": "localhost", "port": "8080"}
//! ```
//!
//! Entries are separated by `,`. In key-value mode a `:` separates the key from
//! its value. Bare text is trimmed, quoted text (single or double quotes) is
//! taken verbatim except that `\` escapes the following character.

use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while parsing delimited text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// An entry was completed without a key (e.g. `","` or `":value"`)
    #[error("empty key at index {index}")]
    EmptyKey { index: usize },
    /// A character followed a closing quote where only whitespace or a separator is allowed
    #[error("unexpected character '{ch}' at index {index}")]
    UnexpectedChar { ch: char, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// `:` is an ordinary character; only keys are produced
    Keys,
    /// `:` separates a key from its value
    KeyValues,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    KeyBegin,
    KeyRaw,
    SingleQuotedKey { escaped: bool },
    DoubleQuotedKey { escaped: bool },
    KeyEnd,
    ValueBegin,
    ValueRaw,
    SingleQuotedValue { escaped: bool },
    DoubleQuotedValue { escaped: bool },
    ValueEnd,
}

struct Scanner {
    mode: Mode,
    key: String,
    value: String,
    entries: Vec<(String, String)>,
}

impl Scanner {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            key: String::new(),
            value: String::new(),
            entries: Vec::new(),
        }
    }

    fn splits_values(&self) -> bool {
        self.mode == Mode::KeyValues
    }

    fn emit(&mut self, index: usize) -> Result<(), ParseError> {
        if self.key.is_empty() {
            return Err(ParseError::EmptyKey { index });
        }
        let key = std::mem::take(&mut self.key);
        let value = std::mem::take(&mut self.value);
        self.entries.push((key, value));
        Ok(())
    }

    /// Transition function of the state machine
    fn step(&mut self, state: State, c: char, index: usize) -> Result<State, ParseError> {
        use State::*;

        let next = match state {
            KeyBegin => match c {
                c if c.is_whitespace() => KeyBegin,
                ',' => {
                    self.emit(index)?;
                    KeyBegin
                }
                ':' if self.splits_values() => ValueBegin,
                '\'' => SingleQuotedKey { escaped: false },
                '"' => DoubleQuotedKey { escaped: false },
                c => {
                    self.key.push(c);
                    KeyRaw
                }
            },
            KeyRaw => match c {
                ',' => {
                    trim_end_in_place(&mut self.key);
                    self.emit(index)?;
                    KeyBegin
                }
                ':' if self.splits_values() => {
                    trim_end_in_place(&mut self.key);
                    ValueBegin
                }
                c => {
                    self.key.push(c);
                    KeyRaw
                }
            },
            SingleQuotedKey { escaped } => {
                quoted(&mut self.key, '\'', escaped, c, KeyEnd, |escaped| {
                    SingleQuotedKey { escaped }
                })
            }
            DoubleQuotedKey { escaped } => {
                quoted(&mut self.key, '"', escaped, c, KeyEnd, |escaped| {
                    DoubleQuotedKey { escaped }
                })
            }
            KeyEnd => match c {
                c if c.is_whitespace() => KeyEnd,
                ':' if self.splits_values() => ValueBegin,
                ',' => {
                    self.emit(index)?;
                    KeyBegin
                }
                ch => return Err(ParseError::UnexpectedChar { ch, index }),
            },
            ValueBegin => match c {
                c if c.is_whitespace() => ValueBegin,
                ',' => {
                    self.emit(index)?;
                    KeyBegin
                }
                '\'' => SingleQuotedValue { escaped: false },
                '"' => DoubleQuotedValue { escaped: false },
                c => {
                    self.value.push(c);
                    ValueRaw
                }
            },
            ValueRaw => match c {
                ',' => {
                    trim_end_in_place(&mut self.value);
                    self.emit(index)?;
                    KeyBegin
                }
                c => {
                    self.value.push(c);
                    ValueRaw
                }
            },
            SingleQuotedValue { escaped } => {
                quoted(&mut self.value, '\'', escaped, c, ValueEnd, |escaped| {
                    SingleQuotedValue { escaped }
                })
            }
            DoubleQuotedValue { escaped } => {
                quoted(&mut self.value, '"', escaped, c, ValueEnd, |escaped| {
                    DoubleQuotedValue { escaped }
                })
            }
            ValueEnd => match c {
                c if c.is_whitespace() => ValueEnd,
                ',' => {
                    self.emit(index)?;
                    KeyBegin
                }
                ch => return Err(ParseError::UnexpectedChar { ch, index }),
            },
        };

        Ok(next)
    }

    /// Flushes the pending entry once the input is exhausted.
    ///
    /// Nothing is pending in `KeyBegin`, so empty input and a single trailing
    /// comma produce no entry. An unterminated quote keeps what was read.
    fn finish(&mut self, state: State, index: usize) -> Result<(), ParseError> {
        match state {
            State::KeyBegin => Ok(()),
            State::KeyRaw => {
                trim_end_in_place(&mut self.key);
                self.emit(index)
            }
            State::ValueRaw => {
                trim_end_in_place(&mut self.value);
                self.emit(index)
            }
            _ => self.emit(index),
        }
    }

    fn run(mut self, raw: &str) -> Result<Vec<(String, String)>, ParseError> {
        let mut state = State::KeyBegin;
        let mut length = 0;
        for (index, c) in raw.chars().enumerate() {
            state = self.step(state, c, index)?;
            length = index + 1;
        }
        self.finish(state, length)?;
        Ok(self.entries)
    }
}

fn quoted(
    buffer: &mut String,
    quote: char,
    escaped: bool,
    c: char,
    closed: State,
    open: impl Fn(bool) -> State,
) -> State {
    if escaped {
        buffer.push(c);
        open(false)
    } else if c == '\\' {
        open(true)
    } else if c == quote {
        closed
    } else {
        buffer.push(c);
        open(false)
    }
}

fn trim_end_in_place(buffer: &mut String) {
    let len = buffer.trim_end().len();
    buffer.truncate(len);
}

/// Parses a list of keys. `:` is treated as part of a bare key.
pub fn parse_keys(raw: &str) -> Result<Vec<String>, ParseError> {
    let entries = Scanner::new(Mode::Keys).run(raw)?;
    Ok(entries.into_iter().map(|(key, _)| key).collect())
}

/// Parses a list of `key:value` pairs in input order. Entries without a value
/// get an empty string.
pub fn parse_key_values(raw: &str) -> Result<Vec<(String, String)>, ParseError> {
    Scanner::new(Mode::KeyValues).run(raw)
}

/// Parses a map. Later duplicates of a key replace earlier ones.
pub fn parse_string_map(raw: &str) -> Result<BTreeMap<String, String>, ParseError> {
    Ok(parse_key_values(raw)?.into_iter().collect())
}

/// Wraps text in double quotes, escaping `"` and `\`
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty()
        || key.trim() != key
        || key.contains([',', ':', '"', '\'', '\\'])
}

pub fn format_strings<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|value| quote(value.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn format_ints(values: &[i64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Formats a map as `key:"value"` entries. Keys stay bare unless they contain
/// separators or quotes; empty values drop the `:value` part.
pub fn format_string_map(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(key, value)| {
            let mut entry = if needs_quoting(key) {
                quote(key)
            } else {
                key.clone()
            };
            if !value.is_empty() {
                entry.push(':');
                entry.push_str(&quote(value));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_keys() {
        let cases: &[(&str, &[&str])] = &[
            ("", &[]),
            ("one", &["one"]),
            ("one,two", &["one", "two"]),
            ("one, two", &["one", "two"]),
            ("  one  ,  two  ", &["one", "two"]),
            ("one two", &["one two"]),
            ("one,", &["one"]),
            (r#""one, two",three"#, &["one, two", "three"]),
            (r#"'one',"two""#, &["one", "two"]),
            (r#""say \"hi\"""#, &[r#"say "hi""#]),
            (r"'it\'s'", &["it's"]),
            (r#""back\\slash""#, &[r"back\slash"]),
            ("one:two", &["one:two"]),
            (r#"" padded ""#, &[" padded "]),
        ];

        for (raw, expected) in cases {
            let keys = parse_keys(raw).unwrap();
            assert_eq!(&keys, expected, "parsing {raw:?}");
        }
    }

    #[test]
    fn test_parse_string_map() {
        let cases: &[(&str, &[(&str, &str)])] = &[
            ("", &[]),
            ("one", &[("one", "")]),
            ("one:value", &[("one", "value")]),
            ("one:value 123", &[("one", "value 123")]),
            ("one : value ", &[("one", "value")]),
            ("one:value,two", &[("one", "value"), ("two", "")]),
            (r#"one:"value""#, &[("one", "value")]),
            ("one:'value'", &[("one", "value")]),
            (r#"one:"value \"123\"""#, &[("one", r#"value "123""#)]),
            (r"one:'value \'123\''", &[("one", "value '123'")]),
            (r#"one:'value "123"'"#, &[("one", r#"value "123""#)]),
            (r#"one:"value '123'""#, &[("one", "value '123'")]),
            (r#""one":value"#, &[("one", "value")]),
            (r#""one 123":value"#, &[("one 123", "value")]),
            (r#""one \"123\"":value"#, &[(r#"one "123""#, "value")]),
            (r#"url:"http://host:80/a,b""#, &[("url", "http://host:80/a,b")]),
        ];

        for (raw, expected) in cases {
            let parsed = parse_string_map(raw).unwrap();
            assert_eq!(parsed, map(expected), "parsing {raw:?}");
        }
    }

    #[test]
    fn test_modes_differ_on_colon() {
        assert_eq!(parse_keys("one,two").unwrap(), vec!["one", "two"]);
        assert_eq!(
            parse_string_map("one,two").unwrap(),
            map(&[("one", ""), ("two", "")])
        );
    }

    #[test]
    fn test_key_values_preserve_order() {
        let entries = parse_key_values("b:1,a:2,b:3").unwrap();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "b"]);
        assert_eq!(parse_string_map("b:1,a:2,b:3").unwrap()["b"], "3");
    }

    #[test]
    fn test_empty_key_errors() {
        assert_eq!(parse_keys(","), Err(ParseError::EmptyKey { index: 0 }));
        assert_eq!(parse_keys("one,,two"), Err(ParseError::EmptyKey { index: 4 }));
        assert_eq!(parse_keys(r#""""#), Err(ParseError::EmptyKey { index: 2 }));
        assert_eq!(
            parse_key_values(":value"),
            Err(ParseError::EmptyKey { index: 6 })
        );
    }

    #[test]
    fn test_unexpected_char_after_quote() {
        assert_eq!(
            parse_keys(r#""one"x"#),
            Err(ParseError::UnexpectedChar { ch: 'x', index: 5 })
        );
        assert_eq!(
            parse_key_values(r#"one:"value" more"#),
            Err(ParseError::UnexpectedChar { ch: 'm', index: 12 })
        );
        // A quoted key may not be followed by ':' when values are not parsed
        assert_eq!(
            parse_keys(r#""one":two"#),
            Err(ParseError::UnexpectedChar { ch: ':', index: 5 })
        );
    }

    #[test]
    fn test_error_index_counts_chars() {
        assert_eq!(
            parse_keys(r#""ø"x"#),
            Err(ParseError::UnexpectedChar { ch: 'x', index: 3 })
        );
    }

    #[test]
    fn test_unterminated_quote_keeps_content() {
        assert_eq!(parse_keys(r#""open"#).unwrap(), vec!["open"]);
    }

    #[test]
    fn test_format_strings() {
        assert_eq!(format_strings::<&str>(&[]), "");
        assert_eq!(format_strings(&["abc"]), r#""abc""#);
        assert_eq!(format_strings(&["a", "b"]), r#""a","b""#);
        assert_eq!(format_strings(&[r#"say "hi""#]), r#""say \"hi\"""#);
    }

    #[test]
    fn test_format_ints() {
        assert_eq!(format_ints(&[]), "");
        assert_eq!(format_ints(&[1]), "1");
        assert_eq!(format_ints(&[1, -2]), "1,-2");
    }

    #[test]
    fn test_format_string_map() {
        assert_eq!(format_string_map(&map(&[])), "");
        assert_eq!(format_string_map(&map(&[("one", "")])), "one");
        assert_eq!(format_string_map(&map(&[("one", "value")])), r#"one:"value""#);
        assert_eq!(
            format_string_map(&map(&[("one", r#"value "123""#)])),
            r#"one:"value \"123\"""#
        );
        assert_eq!(
            format_string_map(&map(&[("a:b", "1"), ("c", "")])),
            r#""a:b":"1",c"#
        );
    }

    #[test]
    fn test_format_then_parse_round_trips() {
        let strings = vec![
            "plain".to_string(),
            "with, comma".to_string(),
            r#"quote " and \ backslash"#.to_string(),
            " spaced ".to_string(),
            "colon:inside".to_string(),
        ];
        assert_eq!(parse_keys(&format_strings(&strings)).unwrap(), strings);

        let m = map(&[
            ("key", "value"),
            ("empty", ""),
            ("odd key, really", "x:y"),
            (" lead", r"'single' \ "),
        ]);
        assert_eq!(parse_string_map(&format_string_map(&m)).unwrap(), m);
    }

    #[test]
    fn test_canonical_form_is_stable() {
        let inputs = [
            r#"one:'value \'123\'', two , "three":3"#,
            "a,b , c",
            r#""x,y":"1",z:'2'"#,
        ];
        for raw in inputs {
            let first = parse_string_map(raw).unwrap();
            let second = parse_string_map(&format_string_map(&first)).unwrap();
            assert_eq!(first, second, "canonicalizing {raw:?}");

            if let Ok(keys) = parse_keys(raw) {
                assert_eq!(parse_keys(&format_strings(&keys)).unwrap(), keys);
            }
        }
    }
}
