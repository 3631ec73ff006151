use primitive_types::U256;

use crate::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token {
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    Comma,
    ColonEquals,
    Let,
    If,
    Identifier(String),
    Number(U256),
}

impl Token {
    pub(super) fn describe(&self) -> String {
        match self {
            Self::LeftBrace => "`{`".into(),
            Self::RightBrace => "`}`".into(),
            Self::LeftParen => "`(`".into(),
            Self::RightParen => "`)`".into(),
            Self::Comma => "`,`".into(),
            Self::ColonEquals => "`:=`".into(),
            Self::Let => "`let`".into(),
            Self::If => "`if`".into(),
            Self::Identifier(name) => format!("identifier `{name}`"),
            Self::Number(value) => format!("number {value}"),
        }
    }
}

/// Token with the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Spanned {
    pub(super) token: Token,
    pub(super) line: usize,
}

pub(super) fn tokenize(source: &str) -> Result<Vec<Spanned>, Diagnostic> {
    let mut tokens = vec![];
    let mut line = 1;
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            '\n' => {
                line += 1;
                continue;
            }
            c if c.is_whitespace() => continue,
            '/' if chars.next_if(|&(_, c)| c == '/').is_some() => {
                while chars.next_if(|&(_, c)| c != '\n').is_some() {}
                continue;
            }
            '/' if chars.next_if(|&(_, c)| c == '*').is_some() => {
                let mut previous = '\0';
                loop {
                    match chars.next() {
                        Some((_, '/')) if previous == '*' => break,
                        Some((_, c)) => {
                            if c == '\n' {
                                line += 1;
                            }
                            previous = c;
                        }
                        None => {
                            return Err(Diagnostic::error(format!(
                                "line {line}: unterminated comment"
                            )))
                        }
                    }
                }
                continue;
            }
            '{' => Token::LeftBrace,
            '}' => Token::RightBrace,
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            ',' => Token::Comma,
            ':' if chars.next_if(|&(_, c)| c == '=').is_some() => Token::ColonEquals,
            c if c.is_ascii_digit() => {
                let mut end = start + c.len_utf8();
                while let Some((index, c)) = chars.next_if(|&(_, c)| c.is_ascii_alphanumeric()) {
                    end = index + c.len_utf8();
                }
                Token::Number(parse_number(&source[start..end], line)?)
            }
            c if is_identifier_start(c) => {
                let mut end = start + c.len_utf8();
                while let Some((index, c)) = chars.next_if(|&(_, c)| is_identifier_part(c)) {
                    end = index + c.len_utf8();
                }
                match &source[start..end] {
                    "let" => Token::Let,
                    "if" => Token::If,
                    name => Token::Identifier(name.to_owned()),
                }
            }
            other => {
                return Err(Diagnostic::error(format!(
                    "line {line}: unexpected character `{other}`"
                )))
            }
        };
        tokens.push(Spanned { token, line });
    }
    Ok(tokens)
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit() || c == '.'
}

fn parse_number(text: &str, line: usize) -> Result<U256, Diagnostic> {
    let parsed = if let Some(hex) = text.strip_prefix("0x") {
        if hex.is_empty() || hex.len() > 64 {
            None
        } else {
            U256::from_str_radix(hex, 16).ok()
        }
    } else if text.bytes().all(|byte| byte.is_ascii_digit()) {
        U256::from_dec_str(text).ok()
    } else {
        None
    };
    parsed.ok_or_else(|| Diagnostic::error(format!("line {line}: invalid number `{text}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn statements() {
        assert_eq!(
            tokens("{ let x := add(1, 0x10) }"),
            [
                Token::LeftBrace,
                Token::Let,
                Token::Identifier("x".into()),
                Token::ColonEquals,
                Token::Identifier("add".into()),
                Token::LeftParen,
                Token::Number(U256::one()),
                Token::Comma,
                Token::Number(U256::from(16)),
                Token::RightParen,
                Token::RightBrace,
            ]
        );
    }

    #[test]
    fn comments_and_lines() {
        let spanned = tokenize("// header\n{ /* a\nb */ x_1 }").unwrap();
        assert_eq!(spanned.len(), 3);
        assert_eq!(spanned[1].token, Token::Identifier("x_1".into()));
        assert_eq!(spanned[1].line, 3);
    }

    #[test]
    fn errors() {
        assert!(tokenize("{ # }").unwrap_err().message.contains("unexpected character"));
        assert!(tokenize("{ 12ab }").unwrap_err().message.contains("invalid number"));
        assert!(tokenize("/* open").unwrap_err().message.contains("unterminated"));
        let too_large = format!("0x1{}", "0".repeat(64));
        assert!(tokenize(&too_large).is_err());
    }
}
