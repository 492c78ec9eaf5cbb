//! T-SQL lexer using nom.
//!
//! Produces a flat token list. Comments are not tokens: each token carries
//! the comments that precede it, and a final `Eof` token carries any
//! trailing ones. Every token and comment gets a running source index, used
//! later to recognize a comment that is offered to the tree twice.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace1, not_line_ending, one_of},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    sequence::{pair, preceded, tuple},
    IResult,
};

use crate::ast::{Comment, CommentKind};
use crate::error::{TranslateError, TranslateResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Keyword or plain identifier.
    Word,
    /// `[name]` or `"name"`; text is the unescaped name.
    QuotedIdent,
    /// `@name` or `@@name`; text includes the sigils.
    Variable,
    /// `'text'`; text is the unescaped value.
    String,
    /// `N'text'`.
    UnicodeString,
    Number,
    /// `0x...`
    Binary,
    Symbol,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset in the source.
    pub offset: usize,
    /// Comments between the previous token and this one.
    pub comments: Vec<Comment>,
    pub index: usize,
}

impl Token {
    /// Case-insensitive keyword test.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && self.text.eq_ignore_ascii_case(word)
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// Split `source` into tokens.
pub fn tokenize(source: &str) -> TranslateResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut pending: Vec<Comment> = Vec::new();
    let mut rest = source;
    let mut line_start = true;
    let mut index = 0;

    while !rest.is_empty() {
        let offset = source.len() - rest.len();

        if let Ok((remaining, space)) = multispace1::<&str, Error<&str>>(rest) {
            if space.contains('\n') {
                line_start = true;
            }
            rest = remaining;
            continue;
        }

        match comment(rest) {
            Ok((remaining, (kind, text))) => {
                pending.push(Comment {
                    kind,
                    starts_new_line: line_start,
                    text: text.to_string(),
                    token_index: index,
                });
                index += 1;
                line_start = kind == CommentKind::SingleLine;
                rest = remaining;
                continue;
            }
            Err(nom::Err::Failure(_)) => {
                return Err(TranslateError::lex(offset, "unterminated comment"));
            }
            Err(_) => {}
        }

        let (remaining, (kind, text)) = token(rest).map_err(|err| match err {
            nom::Err::Failure(_) => TranslateError::lex(offset, "unterminated quoted text"),
            _ => TranslateError::lex(
                offset,
                format!(
                    "unexpected character '{}'",
                    rest.chars().next().unwrap_or(' ')
                ),
            ),
        })?;
        tokens.push(Token {
            kind,
            text,
            offset,
            comments: std::mem::take(&mut pending),
            index,
        });
        index += 1;
        line_start = false;
        rest = remaining;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        offset: source.len(),
        comments: pending,
        index,
    });
    Ok(tokens)
}

fn comment(input: &str) -> IResult<&str, (CommentKind, &str)> {
    if input.starts_with("--") {
        let (rest, text) = recognize(pair(tag("--"), not_line_ending))(input)?;
        return Ok((rest, (CommentKind::SingleLine, text.trim_end())));
    }
    let (rest, text) = block_comment(input)?;
    Ok((rest, (CommentKind::MultiLine, text)))
}

/// `/* ... */`, nesting allowed as in T-SQL.
fn block_comment(input: &str) -> IResult<&str, &str> {
    let (mut rest, _) = tag("/*")(input)?;
    let mut depth = 1;
    while depth > 0 {
        if rest.is_empty() {
            return Err(nom::Err::Failure(Error::new(input, ErrorKind::TakeUntil)));
        }
        if rest.starts_with("/*") {
            depth += 1;
            rest = &rest[2..];
        } else if rest.starts_with("*/") {
            depth -= 1;
            rest = &rest[2..];
        } else {
            let width = rest.chars().next().map_or(1, char::len_utf8);
            rest = &rest[width..];
        }
    }
    let consumed = input.len() - rest.len();
    Ok((rest, &input[..consumed]))
}

fn token(input: &str) -> IResult<&str, (TokenKind, String)> {
    alt((
        string_literal,
        bracketed_identifier,
        quoted_identifier,
        variable,
        binary,
        number,
        word,
        symbol,
    ))(input)
}

/// Text between `quote`s where a doubled `close` stands for itself.
fn delimited_text(input: &str, close: char) -> IResult<&str, String> {
    let mut value = String::new();
    let mut chars = input.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == close {
            if chars.peek().is_some_and(|(_, next)| *next == close) {
                value.push(close);
                chars.next();
                continue;
            }
            return Ok((&input[i + c.len_utf8()..], value));
        }
        value.push(c);
    }
    Err(nom::Err::Failure(Error::new(input, ErrorKind::Char)))
}

fn string_literal(input: &str) -> IResult<&str, (TokenKind, String)> {
    let (rest, unicode) = opt(one_of("Nn"))(input)?;
    let (rest, _) = char('\'')(rest)?;
    let (rest, value) = delimited_text(rest, '\'')?;
    let kind = if unicode.is_some() {
        TokenKind::UnicodeString
    } else {
        TokenKind::String
    };
    Ok((rest, (kind, value)))
}

fn bracketed_identifier(input: &str) -> IResult<&str, (TokenKind, String)> {
    let (rest, _) = char('[')(input)?;
    let (rest, value) = delimited_text(rest, ']')?;
    Ok((rest, (TokenKind::QuotedIdent, value)))
}

fn quoted_identifier(input: &str) -> IResult<&str, (TokenKind, String)> {
    let (rest, _) = char('"')(input)?;
    let (rest, value) = delimited_text(rest, '"')?;
    Ok((rest, (TokenKind::QuotedIdent, value)))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '#' || c == '$' || c == '@'
}

fn variable(input: &str) -> IResult<&str, (TokenKind, String)> {
    let (rest, text) = recognize(pair(
        preceded(char('@'), opt(char('@'))),
        take_while1(is_word_char),
    ))(input)?;
    Ok((rest, (TokenKind::Variable, text.to_string())))
}

fn binary(input: &str) -> IResult<&str, (TokenKind, String)> {
    let (rest, text) = recognize(pair(
        alt((tag("0x"), tag("0X"))),
        take_while(|c: char| c.is_ascii_hexdigit()),
    ))(input)?;
    Ok((rest, (TokenKind::Binary, text.to_string())))
}

fn number(input: &str) -> IResult<&str, (TokenKind, String)> {
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    let (rest, text) = alt((
        recognize(tuple((digit1, opt(pair(char('.'), digit0)), opt(exponent)))),
        recognize(pair(char('.'), digit1)),
    ))(input)?;
    Ok((rest, (TokenKind::Number, text.to_string())))
}

fn word(input: &str) -> IResult<&str, (TokenKind, String)> {
    let (rest, text) = recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_' || c == '#'),
        take_while(is_word_char),
    ))(input)?;
    Ok((rest, (TokenKind::Word, text.to_string())))
}

fn symbol(input: &str) -> IResult<&str, (TokenKind, String)> {
    let (rest, text) = alt((
        alt((
            tag("<>"),
            tag("!="),
            tag("<="),
            tag(">="),
            tag("!<"),
            tag("!>"),
            tag("+="),
            tag("-="),
            tag("*="),
            tag("/="),
            tag("::"),
        )),
        recognize(one_of("(),.;=<>+-*/%&|^~:{}")),
    ))(input)?;
    Ok((rest, (TokenKind::Symbol, text.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_basic_select() {
        let tokens = kinds("select id, [@table].x from t where a >= 1.5");
        assert_eq!(tokens[0], (TokenKind::Word, "select".to_string()));
        assert_eq!(tokens[3], (TokenKind::QuotedIdent, "@table".to_string()));
        assert!(tokens.contains(&(TokenKind::Symbol, ">=".to_string())));
        assert!(tokens.contains(&(TokenKind::Number, "1.5".to_string())));
        assert_eq!(tokens.last().unwrap().0, TokenKind::Eof);
    }

    #[test]
    fn test_strings_and_variables() {
        let tokens = kinds("SET @x = N'it''s' + 'a'");
        assert_eq!(tokens[1], (TokenKind::Variable, "@x".to_string()));
        assert_eq!(tokens[3], (TokenKind::UnicodeString, "it's".to_string()));
        assert_eq!(tokens[5], (TokenKind::String, "a".to_string()));
        let tokens = kinds("select [a]]b], 'x'''");
        assert_eq!(tokens[1], (TokenKind::QuotedIdent, "a]b".to_string()));
        assert_eq!(tokens[3], (TokenKind::String, "x'".to_string()));
    }

    #[test]
    fn test_comments_attach_to_next_token() {
        let tokens = tokenize("-- lead\nselect /* mid */ 1 -- tail").unwrap();
        assert_eq!(tokens[0].comments.len(), 1);
        assert_eq!(tokens[0].comments[0].text, "-- lead");
        assert!(tokens[0].comments[0].starts_new_line);
        assert_eq!(tokens[1].comments[0].kind, CommentKind::MultiLine);
        let eof = tokens.last().unwrap();
        assert!(eof.is_eof());
        assert_eq!(eof.comments[0].text, "-- tail");
        // comments take part in the running index
        assert_eq!(tokens[0].index, 1);
        assert_eq!(tokens[1].index, 3);
    }

    #[test]
    fn test_nested_block_comment() {
        let tokens = tokenize("/* a /* b */ c */ go").unwrap();
        assert_eq!(tokens[0].comments[0].text, "/* a /* b */ c */");
        assert!(tokens[0].is_word("GO"));
    }

    #[test]
    fn test_unterminated_input_is_an_error() {
        assert!(tokenize("select 'abc").is_err());
        assert!(tokenize("/* open").is_err());
        assert!(tokenize("select ?").is_err());
    }
}
