//! Syntax of server type names such as `Map(String, Array(Nullable(Decimal(18, 4))))`.

use std::fmt;

use chwire_common::{Result, error::Error};
use itertools::Itertools;

/// A parsed type name: an identifier with optional parenthesized arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: String,
    pub args: Vec<TypeArg>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    /// A nested type, e.g. the `Int32` of `Array(Int32)`.
    Type(TypeName),
    /// An integer literal, e.g. the precision of `Decimal(18, 4)`.
    Number(i64),
    /// A quoted string, e.g. the time zone of `DateTime('UTC')`.
    String(String),
    /// An enum member, `'name' = value`.
    EnumMember(String, i64),
    /// A named tuple element, `name Type`.
    Named(String, TypeName),
}

impl TypeName {
    pub fn new(name: impl Into<String>) -> TypeName {
        TypeName {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<TypeArg>) -> TypeName {
        TypeName {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            write!(f, "({})", self.args.iter().join(", "))?;
        }
        Ok(())
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Type(ty) => write!(f, "{ty}"),
            TypeArg::Number(n) => write!(f, "{n}"),
            TypeArg::String(s) => write_quoted(f, s),
            TypeArg::EnumMember(name, value) => {
                write_quoted(f, name)?;
                write!(f, " = {value}")
            }
            TypeArg::Named(name, ty) => write!(f, "{name} {ty}"),
        }
    }
}

/// Parses a complete type name. Trailing input is an error.
pub fn parse_type_name(input: &str) -> Result<TypeName> {
    let mut parser = Parser { input, pos: 0 };
    let name = parser.type_name()?;
    parser.skip_whitespace();
    if parser.pos != input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(name)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: &str) -> Error {
        Error::invalid_arg(
            "type_name",
            format!("{message} at offset {} of '{}'", self.pos, self.input),
        )
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn identifier(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_alphanumeric() || c == '_') || (i == 0 && c.is_ascii_digit()))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn type_name(&mut self) -> Result<TypeName> {
        let name = self.identifier()?.to_string();
        let mut args = Vec::new();
        if self.eat('(') {
            if !self.eat(')') {
                loop {
                    args.push(self.argument()?);
                    if self.eat(')') {
                        break;
                    }
                    self.expect(',')?;
                }
            }
        }
        Ok(TypeName { name, args })
    }

    fn argument(&mut self) -> Result<TypeArg> {
        self.skip_whitespace();
        match self.peek() {
            Some('\'') => {
                let text = self.quoted()?;
                if self.eat('=') {
                    Ok(TypeArg::EnumMember(text, self.number()?))
                } else {
                    Ok(TypeArg::String(text))
                }
            }
            Some(c) if c == '-' || c.is_ascii_digit() => Ok(TypeArg::Number(self.number()?)),
            _ => {
                let start = self.pos;
                let first = self.identifier()?;
                self.skip_whitespace();
                match self.peek() {
                    Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                        let ty = self.type_name()?;
                        Ok(TypeArg::Named(first.to_string(), ty))
                    }
                    _ => {
                        self.pos = start;
                        Ok(TypeArg::Type(self.type_name()?))
                    }
                }
            }
        }
    }

    fn number(&mut self) -> Result<i64> {
        self.skip_whitespace();
        let rest = self.rest();
        let sign = usize::from(rest.starts_with('-'));
        let digits = rest[sign..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - sign);
        if digits == 0 {
            return Err(self.error("expected a number"));
        }
        let text = &rest[..sign + digits];
        let value = text
            .parse()
            .map_err(|_| self.error(&format!("number {text} is out of range")))?;
        self.pos += text.len();
        Ok(value)
    }

    fn quoted(&mut self) -> Result<String> {
        self.expect('\'')?;
        let mut text = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\'' => {
                    self.pos += i + 1;
                    return Ok(text);
                }
                '\\' => match chars.next() {
                    Some((_, escaped)) => text.push(escaped),
                    None => break,
                },
                c => text.push(c),
            }
        }
        Err(self.error("unterminated string literal"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_types() {
        let ty = parse_type_name("Map(String, Array(Nullable(Int32)))").unwrap();
        assert_eq!(ty.name, "Map");
        assert_eq!(ty.args.len(), 2);
        let TypeArg::Type(array) = &ty.args[1] else {
            panic!("expected a nested type");
        };
        assert_eq!(array.to_string(), "Array(Nullable(Int32))");
        assert_eq!(ty.to_string(), "Map(String, Array(Nullable(Int32)))");
    }

    #[test]
    fn test_literals() {
        let ty = parse_type_name("DateTime64(3, 'Europe/Berlin')").unwrap();
        assert_eq!(
            ty.args,
            vec![TypeArg::Number(3), TypeArg::String("Europe/Berlin".into())]
        );

        let ty = parse_type_name("Enum8('a' = -1, 'it\\'s' = 2)").unwrap();
        assert_eq!(
            ty.args,
            vec![
                TypeArg::EnumMember("a".into(), -1),
                TypeArg::EnumMember("it's".into(), 2)
            ]
        );
        assert_eq!(ty.to_string(), "Enum8('a' = -1, 'it\\'s' = 2)");
    }

    #[test]
    fn test_named_tuple() {
        let ty = parse_type_name("Tuple(id UInt64, tags Array(String))").unwrap();
        assert_eq!(
            ty.args[0],
            TypeArg::Named("id".into(), TypeName::new("UInt64"))
        );
        assert_eq!(ty.to_string(), "Tuple(id UInt64, tags Array(String))");
    }

    #[test]
    fn test_malformed() {
        for input in ["", "Array(", "Array(Int32", "Int32)", "Decimal(18,)", "Enum8('a = 1)"] {
            assert!(parse_type_name(input).is_err(), "{input}");
        }
    }
}
