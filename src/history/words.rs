// src/history/words.rs
//! Shell-style word splitting and quoting for command lines.
//!
//! Only quoting is understood: single quotes are literal, double quotes allow
//! backslash escapes, and a bare backslash escapes the next character. There
//! is no expansion of any kind.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WordsError {
    #[error("unterminated {0} quote")]
    Unterminated(&'static str),
    #[error("trailing backslash")]
    TrailingBackslash,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    SingleQuoted,
    DoubleQuoted,
}

/// Split a command line into words.
pub fn split_words(line: &str) -> Result<Vec<String>, WordsError> {
    let mut words = Vec::new();
    let mut current = String::new();
    // a quoted empty string still makes a word
    let mut in_word = false;
    let mut mode = Mode::Normal;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match mode {
            Mode::Normal => match ch {
                '\'' => {
                    mode = Mode::SingleQuoted;
                    in_word = true;
                }
                '"' => {
                    mode = Mode::DoubleQuoted;
                    in_word = true;
                }
                '\\' => {
                    current.push(chars.next().ok_or(WordsError::TrailingBackslash)?);
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                c => {
                    current.push(c);
                    in_word = true;
                }
            },
            Mode::SingleQuoted => match ch {
                '\'' => mode = Mode::Normal,
                c => current.push(c),
            },
            Mode::DoubleQuoted => match ch {
                '"' => mode = Mode::Normal,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\' | '$' | '`')) => current.push(next),
                    Some(other) => {
                        current.push('\\');
                        current.push(other);
                    }
                    None => return Err(WordsError::Unterminated("double")),
                },
                c => current.push(c),
            },
        }
    }

    match mode {
        Mode::SingleQuoted => Err(WordsError::Unterminated("single")),
        Mode::DoubleQuoted => Err(WordsError::Unterminated("double")),
        Mode::Normal => {
            if in_word {
                words.push(current);
            }
            Ok(words)
        }
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

/// Quote one word so `split_words` gives it back unchanged.
pub fn quote_word(word: &str) -> String {
    if !word.is_empty() && word.chars().all(is_safe) {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r#"'"'"'"#))
}

/// Quote and join words into one line.
pub fn join_words<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| quote_word(w.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain_and_quoted() {
        assert_eq!(split_words("mv a.txt b.txt").unwrap(), vec!["mv", "a.txt", "b.txt"]);
        assert_eq!(
            split_words(r#"cp 'my file.txt' "other dir"/x"#).unwrap(),
            vec!["cp", "my file.txt", "other dir/x"]
        );
        assert_eq!(split_words(r"rm a\ b").unwrap(), vec!["rm", "a b"]);
        assert_eq!(split_words("grep '' x").unwrap(), vec!["grep", "", "x"]);
        assert!(split_words("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_double_quote_escapes() {
        assert_eq!(split_words(r#""a\"b" "c\d""#).unwrap(), vec![r#"a"b"#, r"c\d"]);
    }

    #[test]
    fn test_split_errors() {
        assert_eq!(split_words("cat 'oops"), Err(WordsError::Unterminated("single")));
        assert_eq!(split_words("cat \"oops"), Err(WordsError::Unterminated("double")));
        assert_eq!(split_words("cat oops\\"), Err(WordsError::TrailingBackslash));
    }

    #[test]
    fn test_quote_word() {
        assert_eq!(quote_word("plain/path.txt"), "plain/path.txt");
        assert_eq!(quote_word("with space"), "'with space'");
        assert_eq!(quote_word(""), "''");
        assert_eq!(quote_word("it's"), r#"'it'"'"'s'"#);
    }

    #[test]
    fn test_join_splits_back() {
        let words = ["cp", "-r", "a b", "it's", "", "$HOME"];
        assert_eq!(split_words(&join_words(&words)).unwrap(), words);
    }
}
