//! Tokenizer for lambda expressions.

use super::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    Op(&'static str),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// 1-based column of the first character.
    pub column: usize,
}

// Longest first so that "**" wins over "*".
const OPERATORS: [&str; 21] = [
    "**", "//", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "(", ")", "[", "]",
    ",", ":", ".", "=",
];

pub fn tokenize(src: &str) -> Result<Vec<Spanned>, ParseError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == '\'' || c == '"' {
            let (s, next) = lex_string(&chars, i, false)?;
            out.push(Spanned { token: Token::Str(s), column });
            i = next;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()))
        {
            let (token, next) = lex_number(&chars, i)?;
            out.push(Spanned { token, column });
            i = next;
            continue;
        }

        if c == '_' || c.is_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i] == '_' || chars[i].is_alphanumeric()) {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();

            // String prefixes: r"..", u"..".
            let raw = matches!(word.as_str(), "r" | "R");
            if (raw || matches!(word.as_str(), "u" | "U"))
                && matches!(chars.get(i), Some('\'') | Some('"'))
            {
                let (s, next) = lex_string(&chars, i, raw)?;
                out.push(Spanned { token: Token::Str(s), column });
                i = next;
                continue;
            }

            out.push(Spanned { token: Token::Name(word), column });
            continue;
        }

        let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
        match OPERATORS.iter().copied().find(|op| rest.starts_with(op)) {
            Some(op) => {
                out.push(Spanned { token: Token::Op(op), column });
                i += op.len();
            }
            None => {
                return Err(ParseError::new(format!("invalid character '{}'", c), column));
            }
        }
    }

    out.push(Spanned { token: Token::Eof, column: chars.len() + 1 });
    Ok(out)
}

fn lex_string(chars: &[char], start: usize, raw: bool) -> Result<(String, usize), ParseError> {
    let quote = chars[start];
    let mut i = start + 1;
    let mut s = String::new();

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            return Ok((s, i + 1));
        }
        if c == '\\' && i + 1 < chars.len() {
            let e = chars[i + 1];
            if raw {
                s.push('\\');
                s.push(e);
            } else {
                match e {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    '0' => s.push('\0'),
                    '\\' | '\'' | '"' => s.push(e),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            i += 2;
            continue;
        }
        s.push(c);
        i += 1;
    }

    Err(ParseError::new("unterminated string literal", start + 1))
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ParseError> {
    let mut i = start;
    let mut is_float = false;

    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' {
        is_float = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            is_float = true;
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text: String = chars[start..i].iter().collect();
    let column = start + 1;
    let token = if is_float {
        Token::Float(
            text.parse()
                .map_err(|_| ParseError::new(format!("invalid number '{}'", text), column))?,
        )
    } else {
        Token::Int(
            text.parse()
                .map_err(|_| ParseError::new(format!("integer out of range '{}'", text), column))?,
        )
    };
    Ok((token, i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn lambda_header_and_operators() {
        assert_eq!(
            tokens("lambda x: x ** 2 // 3"),
            vec![
                Token::Name("lambda".into()),
                Token::Name("x".into()),
                Token::Op(":"),
                Token::Name("x".into()),
                Token::Op("**"),
                Token::Int(2),
                Token::Op("//"),
                Token::Int(3),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(
            tokens(r#"'a\'b' "c\n" r'\d'"#),
            vec![
                Token::Str("a'b".into()),
                Token::Str("c\n".into()),
                Token::Str("\\d".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn floats() {
        assert_eq!(
            tokens("1.5 .5 2e3"),
            vec![Token::Float(1.5), Token::Float(0.5), Token::Float(2000.0), Token::Eof]
        );
    }

    #[test]
    fn errors_carry_columns() {
        let err = tokenize("lambda x: 'open").unwrap_err();
        assert_eq!(err.column, 11);
        assert!(tokenize("lambda x: x $ 1").is_err());
    }
}
