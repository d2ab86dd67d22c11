use std::{collections::BTreeMap, fmt, path::PathBuf, str::FromStr, sync::Arc};

use crate::{
    model::{Val, Value},
    scanner::{Scanner, Token, TokenType},
    schema::Type,
    DecodeError,
};

/// What a [`Decoder`] sees: the token stream and the value being decoded.
pub struct DecodeContext<'a> {
    pub scan: &'a mut Scanner,
    pub value: &'a Value,
}

impl DecodeContext<'_> {
    /// Pops a value and parses it with [`FromStr`].
    pub fn pop_from_str<T: FromStr>(&mut self, expected: &'static str) -> Result<T, DecodeError>
    where
        T::Err: fmt::Display,
    {
        let token = self.scan.pop_value(expected)?;
        from_str(expected, &token.value)
    }
}

/// Turns tokens into a [`Val`].
///
/// A decoder pulls as many tokens as it needs from the scanner, scalars
/// overwrite `target`, collections append to it.
pub trait Decoder: fmt::Debug + Send + Sync {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError>;

    /// The value a slot holds before anything is decoded into it.
    fn zero(&self) -> Val;

    /// Boolean decoders don't consume a following positional and may be
    /// negated.
    fn is_bool(&self) -> bool {
        false
    }
}

pub fn from_str<T: FromStr>(expected: &'static str, value: &str) -> Result<T, DecodeError>
where
    T::Err: fmt::Display,
{
    value.parse::<T>().map_err(|err| DecodeError::Invalid {
        expected,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

/// Decoders keyed by name.
///
/// Lookup precedence: an explicit `type` tag, then the exact declared type
/// name, then the default for the declared kind. Built-in kinds are
/// registered under their own names, so registering `int` overrides how every
/// integer field is decoded.
#[derive(Debug, Clone)]
pub struct Registry {
    named: BTreeMap<String, Arc<dyn Decoder>>,
}

impl Default for Registry {
    fn default() -> Registry {
        let mut res = Registry { named: BTreeMap::new() };
        res.register("bool", BoolDecoder);
        res.register("int", NumberDecoder::Int);
        res.register("uint", NumberDecoder::Uint);
        res.register("float", NumberDecoder::Float);
        res.register("string", StringDecoder);
        res.register("path", PathDecoder);
        res.register("counter", CounterDecoder);
        res
    }
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(&mut self, name: impl Into<String>, decoder: impl Decoder + 'static) {
        self.named.insert(name.into(), Arc::new(decoder));
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<dyn Decoder>> {
        self.named.get(name).cloned()
    }

    pub fn for_type(&self, ty: &Type) -> Option<Arc<dyn Decoder>> {
        let res: Arc<dyn Decoder> = match ty {
            Type::Bool => self.by_name("bool")?,
            Type::Int => self.by_name("int")?,
            Type::Uint => self.by_name("uint")?,
            Type::Float => self.by_name("float")?,
            Type::String => self.by_name("string")?,
            Type::Path => self.by_name("path")?,
            Type::Named(name) => self.by_name(name)?,
            Type::List(elem) => Arc::new(ListDecoder { elem: self.for_type(elem)? }),
            Type::Map(elem) => Arc::new(MapDecoder { elem: self.for_type(elem)? }),
        };
        Some(res)
    }

    pub(crate) fn resolve(&self, explicit: Option<&str>, ty: &Type) -> Option<Arc<dyn Decoder>> {
        match explicit {
            Some(name) => self.by_name(name),
            None => self.for_type(ty),
        }
    }
}

#[derive(Debug)]
struct BoolDecoder;

impl Decoder for BoolDecoder {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError> {
        if ctx.scan.peek().ty != TokenType::FlagValue {
            *target = Val::Bool(true);
            return Ok(());
        }
        let token = ctx.scan.pop();
        let res = match token.value.to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => {
                return Err(DecodeError::Invalid {
                    expected: "bool",
                    value: token.value,
                    reason: "must be true or false".to_string(),
                })
            }
        };
        *target = Val::Bool(res);
        Ok(())
    }

    fn zero(&self) -> Val {
        Val::Bool(false)
    }

    fn is_bool(&self) -> bool {
        true
    }
}

#[derive(Debug)]
enum NumberDecoder {
    Int,
    Uint,
    Float,
}

impl Decoder for NumberDecoder {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError> {
        *target = match self {
            NumberDecoder::Int => Val::Int(ctx.pop_from_str("int")?),
            NumberDecoder::Uint => Val::Uint(ctx.pop_from_str("uint")?),
            NumberDecoder::Float => Val::Float(ctx.pop_from_str("float")?),
        };
        Ok(())
    }

    fn zero(&self) -> Val {
        match self {
            NumberDecoder::Int => Val::Int(0),
            NumberDecoder::Uint => Val::Uint(0),
            NumberDecoder::Float => Val::Float(0.0),
        }
    }
}

#[derive(Debug)]
struct StringDecoder;

impl Decoder for StringDecoder {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError> {
        *target = Val::Str(ctx.scan.pop_value("string")?.value);
        Ok(())
    }

    fn zero(&self) -> Val {
        Val::Str(String::new())
    }
}

#[derive(Debug)]
struct PathDecoder;

impl Decoder for PathDecoder {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError> {
        *target = Val::Path(PathBuf::from(ctx.scan.pop_value("path")?.value));
        Ok(())
    }

    fn zero(&self) -> Val {
        Val::Path(PathBuf::new())
    }
}

/// `-vvv` counts occurrences, `--verbose=3` sets the count.
#[derive(Debug)]
struct CounterDecoder;

impl Decoder for CounterDecoder {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError> {
        if ctx.scan.peek().ty == TokenType::FlagValue {
            *target = Val::Int(ctx.pop_from_str("counter")?);
            return Ok(());
        }
        let current = target.as_int().unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or_else(|| DecodeError::Custom(format!("counter overflows past {current}")))?;
        *target = Val::Int(next);
        Ok(())
    }

    fn zero(&self) -> Val {
        Val::Int(0)
    }
}

#[derive(Debug)]
struct ListDecoder {
    elem: Arc<dyn Decoder>,
}

impl Decoder for ListDecoder {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError> {
        let items = if ctx.value.is_flag() || ctx.scan.peek().ty == TokenType::FlagValue {
            let token = ctx.scan.pop_value("list")?;
            match ctx.value.sep {
                Some(sep) => split_escaped(&token.value, sep),
                None => vec![token.value],
            }
        } else {
            ctx.scan.pop_while(Token::is_value)
        };

        if !matches!(target, Val::List(_)) {
            *target = Val::List(Vec::new());
        }
        for item in items {
            let val = decode_one(&*self.elem, ctx.value, item)?;
            if let Val::List(list) = target {
                list.push(val);
            }
        }
        Ok(())
    }

    fn zero(&self) -> Val {
        Val::List(Vec::new())
    }
}

#[derive(Debug)]
struct MapDecoder {
    elem: Arc<dyn Decoder>,
}

impl Decoder for MapDecoder {
    fn decode(&self, ctx: &mut DecodeContext<'_>, target: &mut Val) -> Result<(), DecodeError> {
        let entries = if ctx.value.is_flag() || ctx.scan.peek().ty == TokenType::FlagValue {
            let token = ctx.scan.pop_value("map")?;
            match ctx.value.map_sep {
                Some(sep) => split_escaped(&token.value, sep),
                None => vec![token.value],
            }
        } else {
            ctx.scan.pop_while(Token::is_value)
        };

        if !matches!(target, Val::Map(_)) {
            *target = Val::Map(Vec::new());
        }
        for entry in entries {
            let (key, value) = match entry.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => return Err(DecodeError::MapEntry(entry)),
            };
            let val = decode_one(&*self.elem, ctx.value, value)?;
            if let Val::Map(map) = target {
                match map.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, slot)) => *slot = val,
                    None => map.push((key, val)),
                }
            }
        }
        Ok(())
    }

    fn zero(&self) -> Val {
        Val::Map(Vec::new())
    }
}

fn decode_one(decoder: &dyn Decoder, value: &Value, literal: String) -> Result<Val, DecodeError> {
    let mut scan = Scanner::from_tokens([Token::new(TokenType::FlagValue, literal)]);
    let mut res = decoder.zero();
    decoder.decode(&mut DecodeContext { scan: &mut scan, value }, &mut res)?;
    Ok(res)
}

/// Splits on `sep`, `\sep` is a literal separator. An empty string has no
/// items.
pub fn split_escaped(s: &str, sep: char) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    let mut res = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&sep) {
            current.push(sep);
            chars.next();
        } else if c == sep {
            res.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    res.push(current);
    res
}
