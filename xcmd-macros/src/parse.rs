use std::{fmt, mem};

#[cfg(not(test))]
use proc_macro::{Delimiter, TokenStream, TokenTree};
#[cfg(test)]
use proc_macro2::{Delimiter, TokenStream, TokenTree};

use crate::ast;

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug)]
pub(crate) struct Error {
    msg: String,
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.msg, f)
    }
}

macro_rules! format_err {
    ($($tt:tt)*) => {
        Error { msg: format!($($tt)*) }
    };
}

macro_rules! bail {
    ($($tt:tt)*) => {
        return Err(format_err!($($tt)*))
    };
}

pub(crate) fn schema(ts: TokenStream) -> Result<ast::Schema> {
    let p = &mut Parser::new(ts);
    fields(p)
}

fn fields(p: &mut Parser) -> Result<ast::Schema> {
    let mut fields = Vec::new();
    while !p.end() {
        fields.push(field(p)?);
    }
    Ok(ast::Schema { fields })
}

// field := doc? ident (':' ty)? string? ('{' field* '}')?
fn field(p: &mut Parser) -> Result<ast::Field> {
    let doc = opt_doc(p)?;
    let ident = p.expect_ident()?;
    let ty = if p.eat_punct(':') { Some(ty(p)?) } else { None };
    let tag = if p.at_string() { Some(p.expect_string()?) } else { None };

    let kind = match ty {
        Some(ty) => ast::FieldKind::Value(ty),
        None if p.at_delim(Delimiter::Brace) => {
            p.enter_delim(Delimiter::Brace)?;
            let schema = fields(p)?;
            p.exit_delim()?;
            ast::FieldKind::Group(schema)
        }
        None => bail!("expected `{ident}: type` or `{ident} {{ ... }}`"),
    };
    Ok(ast::Field { ident, doc, tag, kind })
}

fn ty(p: &mut Parser) -> Result<ast::Ty> {
    if p.at_delim(Delimiter::Bracket) {
        p.enter_delim(Delimiter::Bracket)?;
        let elem = ty(p)?;
        p.exit_delim()?;
        return Ok(ast::Ty::List(Box::new(elem)));
    }
    let name = p.expect_ident()?;
    let res = match name.as_str() {
        "bool" => ast::Ty::Bool,
        "int" => ast::Ty::Int,
        "uint" => ast::Ty::Uint,
        "float" => ast::Ty::Float,
        "string" => ast::Ty::String,
        "path" => ast::Ty::Path,
        "map" if p.at_delim(Delimiter::Bracket) => {
            p.enter_delim(Delimiter::Bracket)?;
            let elem = ty(p)?;
            p.exit_delim()?;
            ast::Ty::Map(Box::new(elem))
        }
        _ => ast::Ty::Named(name),
    };
    Ok(res)
}

fn opt_single_doc(p: &mut Parser) -> Result<Option<String>> {
    if !p.eat_punct('#') {
        return Ok(None);
    }
    p.enter_delim(Delimiter::Bracket)?;
    p.expect_keyword("doc")?;
    p.expect_punct('=')?;
    let mut res = p.expect_string()?;
    if let Some(suf) = res.strip_prefix(' ') {
        res = suf.to_string();
    }
    p.exit_delim()?;
    Ok(Some(res))
}

fn opt_doc(p: &mut Parser) -> Result<Option<String>> {
    let lines =
        core::iter::from_fn(|| opt_single_doc(p).transpose()).collect::<Result<Vec<String>>>()?;
    let lines = lines.join("\n");

    if lines.is_empty() {
        Ok(None)
    } else {
        Ok(Some(lines))
    }
}

struct Parser {
    stack: Vec<Vec<TokenTree>>,
    ts: Vec<TokenTree>,
}

impl Parser {
    fn new(ts: TokenStream) -> Self {
        let mut ts = ts.into_iter().collect::<Vec<_>>();
        ts.reverse();
        Self { stack: Vec::new(), ts }
    }

    fn at_delim(&self, delimiter: Delimiter) -> bool {
        matches!(self.ts.last(), Some(TokenTree::Group(g)) if g.delimiter() == delimiter)
    }
    fn enter_delim(&mut self, delimiter: Delimiter) -> Result<()> {
        match self.ts.pop() {
            Some(TokenTree::Group(g)) if g.delimiter() == delimiter => {
                let mut ts = g.stream().into_iter().collect::<Vec<_>>();
                ts.reverse();
                let ts = mem::replace(&mut self.ts, ts);
                self.stack.push(ts);
            }
            _ => bail!("expected {}", open(delimiter)),
        }
        Ok(())
    }
    fn exit_delim(&mut self) -> Result<()> {
        if !self.end() {
            let next = self.ts.pop().map(|it| it.to_string()).unwrap_or_default();
            bail!("unexpected `{next}`")
        }
        match self.stack.pop() {
            Some(ts) => self.ts = ts,
            None => bail!("unbalanced delimiters"),
        }
        Ok(())
    }
    fn end(&self) -> bool {
        self.ts.last().is_none()
    }

    fn expect_keyword(&mut self, kw: &str) -> Result<()> {
        match self.ts.last() {
            Some(TokenTree::Ident(ident)) if ident.to_string() == kw => {
                self.ts.pop();
                Ok(())
            }
            _ => bail!("expected `{kw}`"),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.ts.pop() {
            Some(TokenTree::Ident(ident)) => {
                let ident = ident.to_string();
                Ok(ident.strip_prefix("r#").map(str::to_string).unwrap_or(ident))
            }
            Some(other) => bail!("expected a name, got: `{other}`"),
            None => bail!("expected a name"),
        }
    }

    fn expect_punct(&mut self, punct: char) -> Result<()> {
        if !self.eat_punct(punct) {
            bail!("expected `{punct}`")
        }
        Ok(())
    }
    fn eat_punct(&mut self, punct: char) -> bool {
        match self.ts.last() {
            Some(TokenTree::Punct(p)) if p.as_char() == punct => {
                self.ts.pop();
                true
            }
            _ => false,
        }
    }

    fn at_string(&self) -> bool {
        match self.ts.last() {
            Some(TokenTree::Literal(lit)) => {
                let lit = lit.to_string();
                lit.starts_with('"') || lit.starts_with('r')
            }
            _ => false,
        }
    }
    fn expect_string(&mut self) -> Result<String> {
        match self.ts.pop() {
            Some(TokenTree::Literal(lit)) => match str_lit_value(&lit.to_string()) {
                Some(it) => Ok(it),
                None => bail!("expected a string, got: `{lit}`"),
            },
            _ => bail!("expected a string"),
        }
    }
}

fn open(delimiter: Delimiter) -> &'static str {
    match delimiter {
        Delimiter::Brace => "`{`",
        Delimiter::Bracket => "`[`",
        Delimiter::Parenthesis => "`(`",
        Delimiter::None => "a group",
    }
}

/// Value of a (possibly raw) string literal.
///
/// The proc_macro API has no accessor for this:
/// <https://internals.rust-lang.org/t/getting-value-out-of-proc-macro-literal/14140>
fn str_lit_value(lit: &str) -> Option<String> {
    if let Some(raw) = lit.strip_prefix('r') {
        let hashes = raw.len() - raw.trim_start_matches('#').len();
        let body = raw.get(hashes..raw.len().checked_sub(hashes)?)?;
        return Some(body.strip_prefix('"')?.strip_suffix('"')?.to_string());
    }
    let body = lit.strip_prefix('"')?.strip_suffix('"')?;

    let mut res = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            res.push(c);
            continue;
        }
        match chars.next()? {
            'n' => res.push('\n'),
            't' => res.push('\t'),
            'r' => res.push('\r'),
            '0' => res.push('\0'),
            'x' => {
                let hex = [chars.next()?, chars.next()?].iter().collect::<String>();
                res.push(char::from(u8::from_str_radix(&hex, 16).ok()?));
            }
            'u' => {
                chars.next().filter(|&it| it == '{')?;
                let hex = chars.by_ref().take_while(|&it| it != '}').collect::<String>();
                res.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            '\n' => {
                while chars.peek().map_or(false, |it| it.is_whitespace()) {
                    chars.next();
                }
            }
            other => res.push(other),
        }
    }
    Some(res)
}
