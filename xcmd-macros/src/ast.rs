#[derive(Debug)]
pub(crate) struct Schema {
    pub(crate) fields: Vec<Field>,
}

#[derive(Debug)]
pub(crate) struct Field {
    pub(crate) ident: String,
    pub(crate) doc: Option<String>,
    pub(crate) tag: Option<String>,
    pub(crate) kind: FieldKind,
}

#[derive(Debug)]
pub(crate) enum FieldKind {
    Value(Ty),
    Group(Schema),
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Ty {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Path,
    Named(String),
    List(Box<Ty>),
    Map(Box<Ty>),
}
