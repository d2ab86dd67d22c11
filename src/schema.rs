use crate::{
    model::{Bindings, HookKind, Hooks},
    BoxError,
};

/// Declared type of a terminal field, used to pick its decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Path,
    /// Looked up by name in the [`Registry`](crate::Registry).
    Named(String),
    List(Box<Type>),
    /// String keys, values of the element type.
    Map(Box<Type>),
}

/// The declarative field tree a [`Grammar`](crate::Grammar) is built from.
///
/// Usually written with the [`schema!`](crate::schema) macro.
#[derive(Debug, Default)]
pub struct Schema {
    pub(crate) fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Schema {
        Schema::default()
    }

    pub fn field(mut self, field: Field) -> Schema {
        self.fields.push(field);
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
}

#[derive(Debug)]
pub struct Field {
    pub(crate) ident: String,
    pub(crate) kind: FieldKind,
    pub(crate) tag: String,
    pub(crate) help: Option<String>,
    pub(crate) hooks: Hooks,
}

#[derive(Debug)]
pub(crate) enum FieldKind {
    Value(Type),
    Group(Schema),
}

impl Field {
    /// A terminal field: a flag, or a positional when tagged `arg`.
    pub fn new(ident: impl Into<String>, ty: Type) -> Field {
        Field::with_kind(ident.into(), FieldKind::Value(ty))
    }

    /// A nested group: a command (`cmd`), a branching argument (`arg`), or
    /// flattened into its parent (`embed`).
    pub fn group(ident: impl Into<String>, schema: Schema) -> Field {
        Field::with_kind(ident.into(), FieldKind::Group(schema))
    }

    fn with_kind(ident: String, kind: FieldKind) -> Field {
        Field { ident, kind, tag: String::new(), help: None, hooks: Hooks::default() }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Field {
        self.tag = tag.into();
        self
    }

    /// Help used when the tag has none.
    pub fn help(mut self, help: impl Into<String>) -> Field {
        self.help = Some(help.into());
        self
    }

    pub fn hook<F>(mut self, kind: HookKind, f: F) -> Field
    where
        F: Fn(&mut Bindings) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.hooks.push(kind, Box::new(f));
        self
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, FieldKind::Group(_))
    }
}

/// External name of a field identifier: words split on `_` and case humps,
/// lower-cased and joined with `sep`.
///
/// `log_file` and `LogFile` both become `log-file`.
pub fn name_from_ident(ident: &str, sep: char) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars = ident.chars().collect::<Vec<_>>();
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).map_or(false, |it| it.is_lowercase());
            if prev_lower || next_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join(&sep.to_string())
}
