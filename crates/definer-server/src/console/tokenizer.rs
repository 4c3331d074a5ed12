//! Console line tokenizer.
//!
//! - Spaces and tabs separate tokens.
//! - `'` and `"` quote; the other quote character is literal inside.
//! - A backslash escapes the next character, inside quotes too.
//! - The first unquoted `=` splits a token into key and value.
//! - One or two leading unquoted `-` mark a flag.
//!
//! A trailing backslash or an unterminated quote is an error.

use thiserror::Error;

/// One console token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Argument {
    /// Text before `=`, or the whole token
    pub key: String,
    /// Text after `=`; `None` when the token has no `=`
    pub value: Option<String>,
    /// Token started with `-` or `--`
    pub flag: bool,
}

impl Argument {
    /// Bare word: no value, not a flag.
    pub fn is_positional(&self) -> bool {
        self.value.is_none() && !self.flag
    }
}

/// Line could not be split into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// Line ends with a lone backslash
    #[error("escape character at end of line")]
    TrailingEscape,

    /// Quote opened but never closed
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),
}

#[derive(Default)]
struct Token {
    argument: Argument,
    dashes: u8,
    /// Only leading dashes seen so far
    leading: bool,
}

impl Token {
    fn push(&mut self, c: char) {
        self.leading = false;
        match &mut self.argument.value {
            Some(value) => value.push(c),
            None => self.argument.key.push(c),
        }
    }
}

/// Split `line` into arguments.
pub fn tokenize(line: &str) -> Result<Vec<Argument>, TokenizeError> {
    let mut arguments = Vec::new();
    let mut current: Option<Token> = None;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            let escaped = chars.next().ok_or(TokenizeError::TrailingEscape)?;
            current.get_or_insert_with(Token::default).push(escaped);
            continue;
        }

        if let Some(open) = quote {
            if c == open {
                quote = None;
            } else {
                current.get_or_insert_with(Token::default).push(c);
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                let token = current.get_or_insert_with(Token::default);
                token.leading = false;
                quote = Some(c);
            },
            ' ' | '\t' => {
                if let Some(token) = current.take() {
                    arguments.push(token.argument);
                }
            },
            '=' => {
                let token = current.get_or_insert_with(Token::default);
                if token.argument.value.is_none() {
                    token.leading = false;
                    token.argument.value = Some(String::new());
                } else {
                    token.push(c);
                }
            },
            '-' => {
                if let Some(token) = current.as_mut() {
                    if token.leading && token.dashes == 1 {
                        token.dashes = 2;
                    } else {
                        token.push(c);
                    }
                } else {
                    current = Some(Token {
                        argument: Argument { flag: true, ..Argument::default() },
                        dashes: 1,
                        leading: true,
                    });
                }
            },
            _ => current.get_or_insert_with(Token::default).push(c),
        }
    }

    if let Some(open) = quote {
        return Err(TokenizeError::UnterminatedQuote(open));
    }
    if let Some(token) = current {
        arguments.push(token.argument);
    }

    Ok(arguments)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn word(key: &str) -> Argument {
        Argument { key: key.into(), value: None, flag: false }
    }

    fn pair(key: &str, value: &str) -> Argument {
        Argument { key: key.into(), value: Some(value.into()), flag: false }
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(tokenize("  router \t get ").unwrap(), [word("router"), word("get")]);
        assert!(tokenize("   ").unwrap().is_empty());
    }

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            tokenize("router ssid=home password=a=b").unwrap(),
            [word("router"), pair("ssid", "home"), pair("password", "a=b")]
        );
        assert_eq!(tokenize("name=").unwrap(), [pair("name", "")]);
    }

    #[test]
    fn quotes_group_and_disappear() {
        assert_eq!(
            tokenize(r#"room name="living room" ssid='it"s'"#).unwrap(),
            [word("room"), pair("name", "living room"), pair("ssid", "it\"s")]
        );
    }

    #[test]
    fn quoted_equals_is_literal() {
        assert_eq!(tokenize("'a=b'").unwrap(), [word("a=b")]);
    }

    #[test]
    fn backslash_escapes_everywhere() {
        assert_eq!(tokenize(r"a\ b").unwrap(), [word("a b")]);
        assert_eq!(tokenize(r#"name="say \"hi\"""#).unwrap(), [pair("name", "say \"hi\"")]);
        assert_eq!(tokenize(r"key\=x").unwrap(), [word("key=x")]);
    }

    #[test]
    fn flags() {
        let args = tokenize("-v --verbose some-thing").unwrap();
        assert_eq!(args[0], Argument { key: "v".into(), value: None, flag: true });
        assert_eq!(args[1], Argument { key: "verbose".into(), value: None, flag: true });
        assert_eq!(args[2], word("some-thing"));
    }

    #[test]
    fn quoted_dash_is_not_a_flag() {
        assert_eq!(tokenize("'-x'").unwrap(), [word("-x")]);
    }

    #[test]
    fn errors_instead_of_panicking() {
        assert_eq!(tokenize("router\\"), Err(TokenizeError::TrailingEscape));
        assert_eq!(tokenize("name=\"open"), Err(TokenizeError::UnterminatedQuote('"')));
    }

    #[test]
    fn empty_quotes_make_an_empty_token() {
        assert_eq!(tokenize("a '' b").unwrap(), [word("a"), word(""), word("b")]);
    }

    proptest! {
        #[test]
        fn never_panics(line in ".*") {
            let _ = tokenize(&line);
        }

        #[test]
        fn plain_words_survive(words in prop::collection::vec("[a-z0-9]{1,8}", 0..8)) {
            let line = words.join(" ");
            let keys: Vec<String> = tokenize(&line).unwrap().into_iter().map(|a| a.key).collect();
            prop_assert_eq!(keys, words);
        }
    }
}
