//! The tag mini-language.
//!
//! ```text
//! tag           := pair (',' pair)*
//! pair          := key ['=' value]
//! value         := quoted | unquoted
//! quoted        := "'" (escaped-quote | any-non-quote)* "'"
//! escaped-quote := '\' "'"
//! ```
use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("unterminated quote in {0:?}")]
    UnterminatedQuote(String),
    #[error("unexpected {ch:?} after closing quote at {pos} in {tag:?}")]
    AfterQuote { tag: String, ch: char, pos: usize },
    #[error("unknown tag key `{0}`")]
    UnknownKey(String),
    #[error("`{key}` is a switch, expected `true` or `false` but got {value:?}")]
    Switch { key: String, value: String },
    #[error("`{key}` must be a single character but got {value:?}")]
    NotAChar { key: String, value: String },
}

/// Raw `key -> values` view of a tag string.
///
/// A key without `=` maps to an empty string. Repeating a key accumulates.
pub type TagItems = BTreeMap<String, Vec<String>>;

const QUOTE: char = '\'';
const SEP: char = ',';
const ASSIGN: char = '=';

pub fn parse_items(tag: &str) -> Result<TagItems, TagError> {
    let mut res = TagItems::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_key = true;
    let mut quoted = false;

    let chars = tag.chars().collect::<Vec<_>>();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        i += 1;

        if !quoted && c == SEP {
            flush(&mut res, &mut key, &mut value);
            in_key = true;
            continue;
        }
        if in_key && c == ASSIGN {
            in_key = false;
            continue;
        }
        let c = if c == '\\' && next == Some(QUOTE) {
            i += 1;
            QUOTE
        } else if c == QUOTE {
            if quoted {
                quoted = false;
                match next {
                    None | Some(SEP) => continue,
                    Some(ch) => {
                        return Err(TagError::AfterQuote { tag: tag.to_string(), ch, pos: i })
                    }
                }
            }
            quoted = true;
            continue;
        } else {
            c
        };
        if in_key {
            key.push(c)
        } else {
            value.push(c)
        }
    }
    if quoted {
        return Err(TagError::UnterminatedQuote(tag.to_string()));
    }
    flush(&mut res, &mut key, &mut value);
    Ok(res)
}

fn flush(items: &mut TagItems, key: &mut String, value: &mut String) {
    let value = std::mem::take(value);
    let key = std::mem::take(key);
    let key = key.trim();
    if key.is_empty() {
        return;
    }
    items.entry(key.to_string()).or_default().push(value);
}

/// Hydrated per-field metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    pub cmd: bool,
    pub arg: bool,
    pub required: bool,
    pub optional: bool,
    pub hidden: bool,
    pub negatable: bool,
    pub embed: bool,
    pub name: Option<String>,
    pub help: Option<String>,
    pub ty: Option<String>,
    pub default: Option<String>,
    pub format: Option<String>,
    pub placeholder: Option<String>,
    pub short: Option<char>,
    pub envs: Vec<String>,
    pub enum_values: Vec<String>,
    pub aliases: Vec<String>,
    /// List separator, `None` disables splitting.
    pub sep: Option<char>,
    pub map_sep: Option<char>,
    pub prefix: Option<String>,
}

impl Tag {
    pub fn parse(tag: &str) -> Result<Tag, TagError> {
        let items = parse_items(tag)?;
        let mut res = Tag { sep: Some(','), map_sep: Some(';'), ..Tag::default() };
        for (key, values) in items {
            let last = values.last().cloned().unwrap_or_default();
            match key.as_str() {
                "cmd" => res.cmd = switch(&key, &last)?,
                "arg" => res.arg = switch(&key, &last)?,
                "required" => res.required = switch(&key, &last)?,
                "optional" => res.optional = switch(&key, &last)?,
                "hidden" => res.hidden = switch(&key, &last)?,
                "negatable" => res.negatable = switch(&key, &last)?,
                "embed" => res.embed = switch(&key, &last)?,
                "name" => res.name = Some(last),
                "help" => res.help = Some(last),
                "type" => res.ty = Some(last),
                "default" => res.default = Some(last),
                "format" => res.format = Some(last),
                "placeholder" => res.placeholder = Some(last),
                "prefix" => res.prefix = Some(last),
                "short" => res.short = Some(single_char(&key, &last)?),
                "env" => res.envs = values.iter().flat_map(|it| list(it)).collect(),
                "enum" => res.enum_values = list(&last),
                "aliases" => res.aliases = list(&last),
                "sep" => res.sep = separator(&key, &last)?,
                "mapsep" => res.map_sep = separator(&key, &last)?,
                _ => return Err(TagError::UnknownKey(key)),
            }
        }
        Ok(res)
    }
}

fn switch(key: &str, value: &str) -> Result<bool, TagError> {
    match value {
        "" | "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(TagError::Switch { key: key.to_string(), value: value.to_string() }),
    }
}

fn single_char(key: &str, value: &str) -> Result<char, TagError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(TagError::NotAChar { key: key.to_string(), value: value.to_string() }),
    }
}

fn separator(key: &str, value: &str) -> Result<Option<char>, TagError> {
    if value == "none" {
        return Ok(None);
    }
    single_char(key, value).map(Some)
}

fn list(value: &str) -> Vec<String> {
    value.split(',').map(str::trim).filter(|it| !it.is_empty()).map(String::from).collect()
}
