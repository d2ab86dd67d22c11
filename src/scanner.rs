use std::fmt;

use crate::DecodeError;

/// Classification of a [`Token`].
///
/// Raw arguments start out [`Untyped`](TokenType::Untyped) and are
/// progressively refined by the parsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Untyped,
    EndOfInput,
    LongFlag,
    FlagValue,
    ShortFlag,
    ShortFlagTail,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub ty: TokenType,
    pub value: String,
}

impl Token {
    pub fn new(ty: TokenType, value: impl Into<String>) -> Token {
        Token { ty, value: value.into() }
    }

    pub fn eol() -> Token {
        Token::new(TokenType::EndOfInput, "")
    }

    pub fn is_eol(&self) -> bool {
        self.ty == TokenType::EndOfInput
    }

    /// Whether this token can be consumed as a value for a flag or a
    /// positional. A lone `-` only becomes a value once retyped as a
    /// positional.
    pub fn is_value(&self) -> bool {
        match self.ty {
            TokenType::FlagValue | TokenType::ShortFlagTail | TokenType::Positional => true,
            TokenType::Untyped => !self.value.starts_with('-'),
            TokenType::EndOfInput | TokenType::LongFlag | TokenType::ShortFlag => false,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            TokenType::LongFlag => write!(f, "--{}", self.value),
            TokenType::ShortFlag | TokenType::ShortFlagTail => write!(f, "-{}", self.value),
            TokenType::FlagValue => write!(f, "={}", self.value),
            TokenType::EndOfInput => f.write_str("EOL"),
            TokenType::Untyped | TokenType::Positional => f.write_str(&self.value),
        }
    }
}

/// A stack of tokens with push-back.
///
/// Tokens are stored reversed, so the front of the input is the top of the
/// stack. Splitting a token into several means pushing the pieces in reverse
/// order: the last one pushed is popped first.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    rargs: Vec<Token>,
}

impl Scanner {
    pub fn new<I, S>(args: I) -> Scanner
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scanner::from_tokens(args.into_iter().map(|it| Token::new(TokenType::Untyped, it)))
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = Token>) -> Scanner {
        let mut rargs = tokens.into_iter().collect::<Vec<_>>();
        rargs.reverse();
        Scanner { rargs }
    }

    /// Scanner over `values`, all typed as `ty`.
    pub fn typed<I, S>(ty: TokenType, values: I) -> Scanner
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scanner::from_tokens(values.into_iter().map(|it| Token::new(ty, it)))
    }

    pub fn len(&self) -> usize {
        self.rargs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rargs.is_empty()
    }

    pub fn pop(&mut self) -> Token {
        self.rargs.pop().unwrap_or_else(Token::eol)
    }

    pub fn peek(&self) -> Token {
        self.rargs.last().cloned().unwrap_or_else(Token::eol)
    }

    /// Pops a value-shaped token, `context` describes what the value is for.
    pub fn pop_value(&mut self, context: &str) -> Result<Token, DecodeError> {
        let token = self.pop();
        if !token.is_value() {
            return Err(DecodeError::ExpectedValue {
                context: context.to_string(),
                token: token.to_string(),
            });
        }
        Ok(token)
    }

    pub fn pop_while(&mut self, mut pred: impl FnMut(&Token) -> bool) -> Vec<String> {
        let mut res = Vec::new();
        while let Some(token) = self.rargs.last() {
            if !pred(token) {
                break;
            }
            res.extend(self.rargs.pop().map(|it| it.value));
        }
        res
    }

    pub fn pop_until(&mut self, mut pred: impl FnMut(&Token) -> bool) -> Vec<String> {
        self.pop_while(|it| !pred(it))
    }

    pub fn push(&mut self, token: Token) {
        self.rargs.push(token)
    }

    pub fn push_typed(&mut self, value: impl Into<String>, ty: TokenType) {
        self.push(Token::new(ty, value))
    }

    /// Everything left is a positional from now on, used for `--`.
    pub(crate) fn retype_remaining(&mut self, ty: TokenType) {
        for token in self.rargs.iter_mut() {
            token.ty = ty;
        }
    }
}
