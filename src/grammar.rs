//! Hand-rolled recursive-descent parser for the package text mini-language
//! (component E, §4.5). The grammar is regular enough that a PEG/parser-
//! combinator dependency isn't warranted; this follows the same
//! cursor-with-peek/advance shape used by this codebase's other readers.
//!
//! The upstream grammar (expressed as a PEG in the reference tooling) is
//! ambiguous between LIST and DICT when read literally — both productions
//! accept a leading newline after `{`. The disambiguation actually applied
//! here matches the documented intent: after any leading blank lines, if
//! what follows parses as a bare `dict_key` immediately followed by `=`,
//! it's a DICT; otherwise it's a LIST.

use crate::error::GrammarError;
use crate::value::{OrderedDict, Value};

const STOP_CHARS: [u8; 4] = [b'{', b'}', b',', b'\n'];

pub fn loads(text: &str) -> Result<Value, GrammarError> {
    let mut p = Parser::new(text.as_bytes());
    p.skip_newlines();
    let dict = p.parse_dict_content(false)?;
    p.skip_newlines();
    if !p.at_end() {
        return Err(p.err("trailing content after root dict"));
    }
    Ok(Value::Dict(dict))
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn err(&self, message: impl Into<String>) -> GrammarError {
        GrammarError::new(self.pos, message.into())
    }

    /// `NEWL := ' '* '\n'`. Returns true if one was consumed.
    fn try_skip_one_newline(&mut self) -> bool {
        let save = self.pos;
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
        if self.peek() == Some(b'\n') {
            self.pos += 1;
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// `NEWL*`
    fn skip_newlines(&mut self) {
        while self.try_skip_one_newline() {}
    }

    fn expect(&mut self, byte: u8) -> Result<(), GrammarError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!(
                "expected {:?}, found {:?}",
                byte as char,
                self.peek().map(|b| b as char)
            )))
        }
    }

    /// Required `NEWL` after a dict pair; lenient at end-of-input.
    fn expect_newl_or_eof(&mut self) -> Result<(), GrammarError> {
        if self.at_end() {
            return Ok(());
        }
        if self.try_skip_one_newline() {
            Ok(())
        } else {
            Err(self.err("expected newline after dict pair"))
        }
    }

    /// Parses zero or more `dict_pair`s. When `nested` is true, stops at
    /// `}` (the caller consumes the closing brace); otherwise stops at
    /// end-of-input (the document root).
    fn parse_dict_content(&mut self, nested: bool) -> Result<OrderedDict, GrammarError> {
        let mut dict = OrderedDict::new();
        loop {
            self.skip_newlines();
            if nested {
                if self.peek() == Some(b'}') {
                    break;
                }
            } else if self.at_end() {
                break;
            }
            let (key, value) = self.parse_dict_pair()?;
            dict.insert(key, value);
        }
        Ok(dict)
    }

    fn parse_dict_pair(&mut self) -> Result<(String, Value), GrammarError> {
        let key = self.read_dict_key()?;
        self.expect(b'=')?;
        let value = self.parse_value()?;
        self.expect_newl_or_eof()?;
        Ok((key, value))
    }

    /// `dict_key := [^={},\n]+`
    fn read_dict_key(&mut self) -> Result<String, GrammarError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'=' || STOP_CHARS.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected a dict key"));
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn parse_value(&mut self) -> Result<Value, GrammarError> {
        match self.peek() {
            Some(b'"') => self.parse_quoted_string(),
            Some(b'{') => self.parse_table(),
            Some(_) => self.parse_number_or_raw_string(),
            None => Err(self.err("expected a value, found end of input")),
        }
    }

    fn parse_quoted_string(&mut self) -> Result<Value, GrammarError> {
        self.expect(b'"')?;
        let start = self.pos;
        loop {
            match self.advance() {
                Some(b'"') => {
                    let body = &self.bytes[start..self.pos - 1];
                    return Ok(Value::String(String::from_utf8_lossy(body).into_owned()));
                }
                Some(_) => continue,
                None => return Err(self.err("unterminated quoted string")),
            }
        }
    }

    /// `LIST := '{' list_content? '}'` / `DICT := '{' NEWL dict_content '}'`
    ///
    /// A DICT requires a newline directly after `{`; a LIST's first
    /// non-newline content is a plain value token or `}`. So a brace with
    /// no leading newline at all is always a LIST, even if its first token
    /// happens to contain `=` (e.g. `{foo=bar,baz}`); only once a leading
    /// newline was actually consumed do we look for the `key=value` shape
    /// that distinguishes a DICT from a LIST whose first item is itself on
    /// its own line.
    fn parse_table(&mut self) -> Result<Value, GrammarError> {
        self.expect(b'{')?;
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::List(Vec::new()));
        }

        let had_leading_newline = self.try_skip_one_newline();
        if had_leading_newline {
            self.skip_newlines();
        }
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(Value::List(Vec::new()));
        }

        if had_leading_newline && self.looks_like_dict_pair() {
            let dict = self.parse_dict_content(true)?;
            self.expect(b'}')?;
            Ok(Value::Dict(dict))
        } else {
            let items = self.parse_list_content()?;
            self.expect(b'}')?;
            Ok(Value::List(items))
        }
    }

    /// Scans ahead (without consuming) to see whether the upcoming tokens
    /// form `dict_key '='`: a run of bytes outside `={},\n` immediately
    /// followed by `=`.
    fn looks_like_dict_pair(&self) -> bool {
        let mut i = self.pos;
        if self.bytes.get(i) == Some(&b'=') {
            // Empty key before '=' never happens for a real dict_key, which
            // requires one-or-more chars; treat as "not a dict".
            return false;
        }
        loop {
            match self.bytes.get(i) {
                Some(b'=') => return true,
                Some(b) if STOP_CHARS.contains(b) => return false,
                Some(_) => i += 1,
                None => return false,
            }
        }
    }

    fn can_start_value(&self) -> bool {
        matches!(self.peek(), Some(b) if b != b'}')
    }

    /// `list_content := NEWL* list_item ( ',' NEWL? list_item )* ','? NEWL*`
    /// (the leading `NEWL*` was already consumed by the caller).
    fn parse_list_content(&mut self) -> Result<Vec<Value>, GrammarError> {
        let mut items = vec![self.parse_value()?];
        loop {
            if self.peek() != Some(b',') {
                break;
            }
            self.pos += 1; // consume ','
            self.try_skip_one_newline();
            if !self.can_start_value() {
                // Trailing comma (optionally followed by the newline we
                // just consumed) right before the closing brace.
                break;
            }
            items.push(self.parse_value()?);
        }
        self.skip_newlines();
        Ok(items)
    }

    fn parse_number_or_raw_string(&mut self) -> Result<Value, GrammarError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if STOP_CHARS.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected a value"));
        }
        let token = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| GrammarError::new(start, "invalid UTF-8 in value token"))?;

        Ok(match classify_numeric(token) {
            // `classify_numeric` only validates digit shape, not range: a
            // token with more digits than `i64` can hold (the grammar's
            // INT has no magnitude limit) falls back to a raw string
            // rather than panicking.
            Some(NumKind::Int) => match token.parse::<i64>() {
                Ok(i) => Value::Int(i),
                Err(_) => Value::String(token.to_string()),
            },
            Some(NumKind::Float) => Value::Float(token.parse().expect("validated float token")),
            None => Value::String(token.to_string()),
        })
    }
}

enum NumKind {
    Int,
    Float,
}

/// Classifies a raw token as `INT`, `FLOAT`, or neither (raw string), per
/// §4.5's `INT`/`FLOAT` productions. A token that starts with digits but
/// contains any other character (a UUID, a hex blob, `1x1`) falls through
/// to raw string, matching the documented RAW_STRING-vs-INT rule.
fn classify_numeric(token: &str) -> Option<NumKind> {
    let bytes = token.as_bytes();
    let mut i = 0;
    if bytes.get(i) == Some(&b'-') {
        i += 1;
    }
    let digits_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start {
        return None;
    }

    if bytes.get(i) != Some(&b'.') {
        return if i == bytes.len() {
            Some(NumKind::Int)
        } else {
            None
        };
    }

    // Float: require '.' followed by one or more digits.
    i += 1;
    let frac_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == frac_start {
        return None;
    }

    if bytes.get(i) == Some(&b'e') {
        i += 1;
        match bytes.get(i) {
            Some(b'+') | Some(b'-') => i += 1,
            _ => return None,
        }
        let exp_start = i;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
    }

    if i == bytes.len() {
        Some(NumKind::Float)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict_of(pairs: Vec<(&str, Value)>) -> Value {
        let mut d = OrderedDict::new();
        for (k, v) in pairs {
            d.insert(k.to_string(), v);
        }
        Value::Dict(d)
    }

    #[test]
    fn scenario_1_string_value() {
        assert_eq!(
            loads("A=B\n").unwrap(),
            dict_of(vec![("A", Value::String("B".into()))])
        );
    }

    #[test]
    fn scenario_2_int_value() {
        assert_eq!(loads("A=1\n").unwrap(), dict_of(vec![("A", Value::Int(1))]));
    }

    #[test]
    fn scenario_3_float_value() {
        assert_eq!(
            loads("A=1.0\n").unwrap(),
            dict_of(vec![("A", Value::Float(1.0))])
        );
    }

    #[test]
    fn scenario_4_empty_list() {
        assert_eq!(
            loads("A={}\n").unwrap(),
            dict_of(vec![("A", Value::List(vec![]))])
        );
    }

    #[test]
    fn scenario_5_nested_dict() {
        let inner = dict_of(vec![("A", Value::Int(1))]);
        assert_eq!(
            loads("A={\nA=1\n}\n").unwrap(),
            dict_of(vec![("A", inner)])
        );
    }

    #[test]
    fn scenario_6_int_list() {
        assert_eq!(
            loads("A={1,2,3}\n").unwrap(),
            dict_of(vec![(
                "A",
                Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            )])
        );
    }

    #[test]
    fn scenario_7_raw_string_list_with_trailing_comma() {
        assert_eq!(
            loads("A={\nRawString1,RawString2,\n}\n").unwrap(),
            dict_of(vec![(
                "A",
                Value::List(vec![
                    Value::String("RawString1".into()),
                    Value::String("RawString2".into()),
                ])
            )])
        );
    }

    #[test]
    fn list_with_no_leading_newline_wins_even_if_first_item_has_equals() {
        // No newline right after '{', so this is a LIST whose one item is
        // the raw string "foo=bar", not a DICT pair.
        assert_eq!(
            loads("A={foo=bar,baz}\n").unwrap(),
            dict_of(vec![(
                "A",
                Value::List(vec![
                    Value::String("foo=bar".into()),
                    Value::String("baz".into()),
                ])
            )])
        );
    }

    #[test]
    fn int_wider_than_i64_falls_back_to_raw_string() {
        assert_eq!(
            loads("A=99999999999999999999\n").unwrap(),
            dict_of(vec![("A", Value::String("99999999999999999999".into()))])
        );
    }

    #[test]
    fn scenario_8_raw_string_digit_prefixed() {
        assert_eq!(
            loads("A=1x1\n").unwrap(),
            dict_of(vec![("A", Value::String("1x1".into()))])
        );
    }

    #[test]
    fn scenario_9_negative_scientific_float() {
        assert_eq!(
            loads("A=-9.2029601e-05\n").unwrap(),
            dict_of(vec![("A", Value::Float(-9.2029601e-05))])
        );
    }

    #[test]
    fn scenario_10_uuid_is_raw_string() {
        let uuid = "88c1934b-3e5e-4f63-a599-1670f585aee2";
        assert_eq!(
            loads(&format!("A={uuid}\n")).unwrap(),
            dict_of(vec![("A", Value::String(uuid.into()))])
        );
    }

    #[test]
    fn scenario_11_quoted_url_passes_through_literally() {
        let text = "A={\nB=\"https://example.com/?a=b\"\n}\n";
        let inner = dict_of(vec![("B", Value::String("https://example.com/?a=b".into()))]);
        assert_eq!(loads(text).unwrap(), dict_of(vec![("A", inner)]));
    }

    #[test]
    fn empty_input_yields_empty_dict() {
        assert_eq!(loads("").unwrap(), Value::Dict(OrderedDict::new()));
    }

    #[test]
    fn leading_and_trailing_blank_lines_are_accepted() {
        assert_eq!(
            loads("\n\nA=1\n\n\n").unwrap(),
            dict_of(vec![("A", Value::Int(1))])
        );
    }

    #[test]
    fn later_key_overwrites_earlier_one() {
        let mut d = OrderedDict::new();
        d.insert("A".into(), Value::Int(2));
        assert_eq!(loads("A=1\nA=2\n").unwrap(), Value::Dict(d));
    }

    #[test]
    fn malformed_input_is_a_grammar_error() {
        assert!(loads("A=\n").is_err());
        assert!(loads("=B\n").is_err());
    }
}
