use std::collections::BTreeMap;

use thiserror::Error;

/// Variables available to `${name}` interpolation.
pub type Vars = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpolateError {
    #[error("undefined variable ${{{0}}}")]
    Undefined(String),
    #[error("unterminated variable reference in {0:?}")]
    Unterminated(String),
}

/// Expands `${name}` and `${name=fallback}` references, `$$` is a literal `$`.
///
/// Later maps in `scopes` shadow earlier ones.
pub fn interpolate(s: &str, scopes: &[&Vars]) -> Result<String, InterpolateError> {
    let mut res = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(idx) = rest.find('$') {
        res.push_str(&rest[..idx]);
        rest = &rest[idx..];
        if let Some(tail) = rest.strip_prefix("$$") {
            res.push('$');
            rest = tail;
            continue;
        }
        let Some(body) = rest.strip_prefix("${") else {
            res.push('$');
            rest = &rest[1..];
            continue;
        };
        let end = body.find('}').ok_or_else(|| InterpolateError::Unterminated(s.to_string()))?;
        let (name, fallback) = match body[..end].split_once('=') {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (&body[..end], None),
        };
        match lookup(scopes, name).or(fallback) {
            Some(value) => res.push_str(value),
            None => return Err(InterpolateError::Undefined(name.to_string())),
        }
        rest = &body[end + 1..];
    }
    res.push_str(rest);
    Ok(res)
}

fn lookup<'a>(scopes: &[&'a Vars], name: &str) -> Option<&'a str> {
    scopes.iter().rev().find_map(|vars| vars.get(name)).map(String::as_str)
}
