use crate::parser::{self, ParseError};
use std::{collections::BTreeMap, num::ParseIntError, time::Duration};
use thiserror::Error;

/// Why a raw environment value could not be turned into a field value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("value is not allowed (allowed values are {allowed})")]
    NotAllowed { allowed: String },
    #[error("expected one of '1', 'true', 'yes', '0', 'false' or 'no'")]
    Bool,
    #[error("invalid hex: {0}")]
    Hex(#[from] HexError),
    #[error("invalid integer: {0}")]
    Int(#[from] ParseIntError),
    #[error("invalid duration: {0}")]
    Duration(String),
    #[error("invalid element '{element}': {source}")]
    Element {
        element: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid syntax: {0}")]
    Syntax(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("odd number of digits")]
    OddLength,
    #[error("'{ch}' at index {index} is not a hex digit")]
    InvalidDigit { ch: char, index: usize },
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for bool {}
    impl Sealed for Vec<u8> {}
    impl Sealed for i64 {}
    impl Sealed for std::time::Duration {}
    impl Sealed for String {}
    impl Sealed for Vec<String> {}
    impl Sealed for Vec<i64> {}
    impl Sealed for std::collections::BTreeMap<String, String> {}
}

/// A type that can be stored in a [`Field`](crate::Field).
///
/// Implemented for the closed set of supported kinds: `bool`, `Vec<u8>`
/// (hex), `i64`, `Duration`, `String`, `Vec<String>`, `Vec<i64>` and
/// `BTreeMap<String, String>`.
pub trait FieldValue: sealed::Sealed + Clone + Send + Sync + 'static {
    /// Kind label used in generated descriptions
    const LABEL: &'static str;

    /// Converts trimmed raw text into a value
    fn parse_raw(raw: &str) -> Result<Self, ValueError>;

    /// Formats a value in the form `parse_raw` accepts
    fn format_raw(&self) -> String;
}

impl FieldValue for bool {
    const LABEL: &'static str = "Boolean";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        match raw {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ValueError::Bool),
        }
    }

    fn format_raw(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for Vec<u8> {
    const LABEL: &'static str = "Bytes";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        Ok(decode_hex(raw)?)
    }

    fn format_raw(&self) -> String {
        self.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl FieldValue for i64 {
    const LABEL: &'static str = "Int";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        Ok(raw.parse()?)
    }

    fn format_raw(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for Duration {
    const LABEL: &'static str = "Duration";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        humantime::parse_duration(raw).map_err(|e| ValueError::Duration(e.to_string()))
    }

    fn format_raw(&self) -> String {
        humantime::format_duration(*self).to_string()
    }
}

impl FieldValue for String {
    const LABEL: &'static str = "String";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        Ok(raw.to_string())
    }

    fn format_raw(&self) -> String {
        self.clone()
    }
}

impl FieldValue for Vec<String> {
    const LABEL: &'static str = "StringArray";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        Ok(parser::parse_keys(raw)?)
    }

    fn format_raw(&self) -> String {
        parser::format_strings(self)
    }
}

impl FieldValue for Vec<i64> {
    const LABEL: &'static str = "IntArray";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        parser::parse_keys(raw)?
            .into_iter()
            .map(|element| match element.parse() {
                Ok(value) => Ok(value),
                Err(source) => Err(ValueError::Element { element, source }),
            })
            .collect()
    }

    fn format_raw(&self) -> String {
        parser::format_ints(self)
    }
}

impl FieldValue for BTreeMap<String, String> {
    const LABEL: &'static str = "StringStringMap";

    fn parse_raw(raw: &str) -> Result<Self, ValueError> {
        Ok(parser::parse_string_map(raw)?)
    }

    fn format_raw(&self) -> String {
        parser::format_string_map(self)
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, HexError> {
    let digits = raw.as_bytes();
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }
    digits
        .chunks(2)
        .enumerate()
        .map(|(pair, chunk)| {
            let high = hex_digit(chunk[0], pair * 2)?;
            let low = hex_digit(chunk[1], pair * 2 + 1)?;
            Ok(high << 4 | low)
        })
        .collect()
}

fn hex_digit(digit: u8, index: usize) -> Result<u8, HexError> {
    let ch = digit as char;
    ch.to_digit(16)
        .map(|value| value as u8)
        .ok_or(HexError::InvalidDigit { ch, index })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool() {
        for raw in ["1", "true", "yes"] {
            assert_eq!(bool::parse_raw(raw), Ok(true));
        }
        for raw in ["0", "false", "no"] {
            assert_eq!(bool::parse_raw(raw), Ok(false));
        }
        assert_eq!(bool::parse_raw("okaydokay"), Err(ValueError::Bool));
        assert_eq!(bool::parse_raw("TRUE"), Err(ValueError::Bool));
        assert_eq!(true.format_raw(), "true");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(
            Vec::<u8>::parse_raw("ffeeddcc"),
            Ok(vec![0xff, 0xee, 0xdd, 0xcc])
        );
        assert_eq!(Vec::<u8>::parse_raw("FFee"), Ok(vec![0xff, 0xee]));
        assert_eq!(Vec::<u8>::parse_raw(""), Ok(vec![]));
        assert_eq!(
            Vec::<u8>::parse_raw("xyz"),
            Err(ValueError::Hex(HexError::OddLength))
        );
        assert_eq!(
            Vec::<u8>::parse_raw("0g"),
            Err(ValueError::Hex(HexError::InvalidDigit { ch: 'g', index: 1 }))
        );
        assert_eq!(vec![0u8, 1, 2, 3].format_raw(), "00010203");
    }

    #[test]
    fn test_int() {
        assert_eq!(i64::parse_raw("2"), Ok(2));
        assert_eq!(i64::parse_raw("-42"), Ok(-42));
        assert!(matches!(i64::parse_raw("abc"), Err(ValueError::Int(_))));
        assert!(matches!(
            i64::parse_raw("99999999999999999999"),
            Err(ValueError::Int(_))
        ));
        assert_eq!(8080i64.format_raw(), "8080");
    }

    #[test]
    fn test_duration() {
        assert_eq!(Duration::parse_raw("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(Duration::parse_raw("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(Duration::parse_raw("1h 30m"), Ok(Duration::from_secs(5400)));
        assert_eq!(Duration::parse_raw("250ms"), Ok(Duration::from_millis(250)));
        assert!(matches!(
            Duration::parse_raw("okaydokay"),
            Err(ValueError::Duration(_))
        ));
        assert_eq!(Duration::from_secs(5).format_raw(), "5s");
        assert_eq!(Duration::from_secs(90).format_raw(), "1m 30s");
    }

    #[test]
    fn test_string_is_verbatim() {
        assert_eq!(String::parse_raw("a, b:c"), Ok("a, b:c".to_string()));
        assert_eq!("abc".to_string().format_raw(), "abc");
    }

    #[test]
    fn test_string_array() {
        assert_eq!(
            Vec::<String>::parse_raw("def, 'g,h'"),
            Ok(vec!["def".to_string(), "g,h".to_string()])
        );
        assert_eq!(vec!["abc".to_string()].format_raw(), r#""abc""#);
        assert_eq!(
            Vec::<String>::parse_raw(","),
            Err(ValueError::Syntax(ParseError::EmptyKey { index: 0 }))
        );
    }

    #[test]
    fn test_int_array() {
        assert_eq!(Vec::<i64>::parse_raw(""), Ok(vec![]));
        assert_eq!(Vec::<i64>::parse_raw("1"), Ok(vec![1]));
        assert_eq!(Vec::<i64>::parse_raw("1, 2"), Ok(vec![1, 2]));
        assert_eq!(Vec::<i64>::parse_raw(r#""1", 2"#), Ok(vec![1, 2]));
        assert_eq!(vec![1i64, 2].format_raw(), "1,2");

        match Vec::<i64>::parse_raw("1,two,3") {
            Err(ValueError::Element { element, .. }) => assert_eq!(element, "two"),
            other => panic!("expected element error, got {other:?}"),
        }
    }

    #[test]
    fn test_string_map() {
        let parsed = BTreeMap::<String, String>::parse_raw("def:123").unwrap();
        assert_eq!(parsed.get("def").map(String::as_str), Some("123"));

        let default: BTreeMap<String, String> =
            [("abc".to_string(), "123".to_string())].into_iter().collect();
        assert_eq!(default.format_raw(), r#"abc:"123""#);
    }

    #[test]
    fn test_labels() {
        assert_eq!(bool::LABEL, "Boolean");
        assert_eq!(<Vec<u8>>::LABEL, "Bytes");
        assert_eq!(i64::LABEL, "Int");
        assert_eq!(Duration::LABEL, "Duration");
        assert_eq!(String::LABEL, "String");
        assert_eq!(<Vec<String>>::LABEL, "StringArray");
        assert_eq!(<Vec<i64>>::LABEL, "IntArray");
        assert_eq!(<BTreeMap<String, String>>::LABEL, "StringStringMap");
    }
}
