//! Tokenizer for the argument tail of a command line.

use std::{iter::Peekable, str::Chars};

use super::CommandError;
use crate::models::Value;

/// Arguments as written, before the command kind interprets them.
#[derive(Debug, Default, PartialEq)]
pub(super) struct RawArgs {
    pub positional: Option<Value>,
    pub pairs: Vec<(String, Value)>,
}

/// Splits `tail` into an optional leading positional value and `key=value`
/// pairs.
pub(super) fn lex(tail: &str) -> Result<RawArgs, CommandError> {
    let mut chars = tail.chars().peekable();
    let mut args = RawArgs::default();

    loop {
        skip_whitespace(&mut chars);
        let Some(&c) = chars.peek() else { break };

        if c == '"' {
            chars.next();
            let text = read_quoted(&mut chars)?;
            push_positional(&mut args, Value::Text(text))?;
            continue;
        }

        let word = read_word(&mut chars);
        match chars.peek() {
            Some('=') => {
                chars.next();
                validate_key(&word)?;
                let value = read_value(&mut chars, &word)?;
                if args.pairs.iter().any(|(key, _)| *key == word) {
                    return Err(CommandError::DuplicateKey { key: word });
                }
                args.pairs.push((word, value));
            }
            Some('"') => {
                return Err(CommandError::InvalidBareValue {
                    value: format!("{word}\""),
                });
            }
            _ => push_positional(&mut args, Value::from_bare(&word))?,
        }
    }

    Ok(args)
}

fn push_positional(args: &mut RawArgs, value: Value) -> Result<(), CommandError> {
    if !args.pairs.is_empty() {
        return Err(CommandError::MisplacedPositional);
    }
    if args.positional.is_some() {
        return Err(CommandError::ExtraPositional {
            value: value.into_text(),
        });
    }
    args.positional = Some(value);
    Ok(())
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.next_if(|c| c.is_whitespace()).is_some() {}
}

/// Reads up to whitespace, `=` or `"`.
fn read_word(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=' && *c != '"') {
        word.push(c);
    }
    word
}

fn read_value(chars: &mut Peekable<Chars<'_>>, key: &str) -> Result<Value, CommandError> {
    match chars.peek() {
        Some('"') => {
            chars.next();
            Ok(Value::Text(read_quoted(chars)?))
        }
        Some(c) if !c.is_whitespace() => {
            let mut bare = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                bare.push(c);
            }
            if bare.contains('=') || bare.contains('"') {
                return Err(CommandError::InvalidBareValue { value: bare });
            }
            Ok(Value::from_bare(&bare))
        }
        _ => Err(CommandError::MissingValue {
            key: key.to_string(),
        }),
    }
}

/// Reads a quoted string; the opening quote has been consumed.
fn read_quoted(chars: &mut Peekable<Chars<'_>>) -> Result<String, CommandError> {
    let mut text = String::new();
    loop {
        match chars.next() {
            None => return Err(CommandError::UnterminatedQuote),
            Some('"') => break,
            Some('\\') => match chars.next() {
                Some('"') => text.push('"'),
                Some('\\') => text.push('\\'),
                Some('n') => text.push('\n'),
                Some('r') => text.push('\r'),
                Some('t') => text.push('\t'),
                Some(other) => return Err(CommandError::InvalidEscape { escape: other }),
                None => return Err(CommandError::UnterminatedQuote),
            },
            Some(c) => text.push(c),
        }
    }
    if chars.peek().is_some_and(|c| !c.is_whitespace()) {
        return Err(CommandError::MissingSeparator { value: text });
    }
    Ok(text)
}

/// Keys are `[A-Za-z][A-Za-z0-9_-]*`.
fn validate_key(key: &str) -> Result<(), CommandError> {
    let mut bytes = key.bytes();
    let valid = bytes.next().is_some_and(|b| b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(CommandError::InvalidKey {
            key: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(key: &str, value: Value) -> (String, Value) {
        (key.to_string(), value)
    }

    #[test]
    fn lexes_positional_and_pairs() {
        let args = lex(r#"  7   name="Hotel \"Le Marais\""  nights=3 paid=true "#).unwrap();
        assert_eq!(args.positional, Some(Value::Number("7".into())));
        assert_eq!(
            args.pairs,
            vec![
                pair("name", Value::from("Hotel \"Le Marais\"")),
                pair("nights", Value::Number("3".into())),
                pair("paid", Value::Bool(true)),
            ]
        );
    }

    #[test]
    fn quoted_positional_keeps_spaces() {
        let args = lex(r#""ramen near shinjuku""#).unwrap();
        assert_eq!(args.positional, Some(Value::from("ramen near shinjuku")));
        assert!(args.pairs.is_empty());
    }

    #[test]
    fn escapes_decode() {
        let args = lex(r#"notes="line one\nline two\\end""#).unwrap();
        assert_eq!(args.pairs[0].1, Value::from("line one\nline two\\end"));
    }

    #[test]
    fn quoted_true_stays_text() {
        let args = lex(r#"flag="true""#).unwrap();
        assert_eq!(args.pairs[0].1, Value::from("true"));
    }

    #[test]
    fn empty_quotes_are_a_value() {
        let args = lex(r#"notes="""#).unwrap();
        assert_eq!(args.pairs[0].1, Value::blank());
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(lex(r#"name="open"#), Err(CommandError::UnterminatedQuote));
        assert_eq!(
            lex(r#"name="a\qb""#),
            Err(CommandError::InvalidEscape { escape: 'q' })
        );
        assert_eq!(
            lex("name= x"),
            Err(CommandError::MissingValue { key: "name".into() })
        );
        assert_eq!(
            lex("a=1 a=2"),
            Err(CommandError::DuplicateKey { key: "a".into() })
        );
        assert_eq!(
            lex("1bad=x"),
            Err(CommandError::InvalidKey { key: "1bad".into() })
        );
        assert_eq!(
            lex("a=b=c"),
            Err(CommandError::InvalidBareValue { value: "b=c".into() })
        );
        assert_eq!(lex("a=1 loose"), Err(CommandError::MisplacedPositional));
        assert_eq!(
            lex("one two"),
            Err(CommandError::ExtraPositional { value: "two".into() })
        );
        assert_eq!(
            lex(r#"a="x"y"#),
            Err(CommandError::MissingSeparator { value: "x".into() })
        );
    }
}
