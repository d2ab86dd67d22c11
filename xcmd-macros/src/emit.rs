use crate::ast;

use std::fmt::Write;

macro_rules! w {
    ($($tt:tt)*) => {
        drop(write!($($tt)*))
    };
}

pub(crate) fn emit(schema: &ast::Schema) -> String {
    let mut buf = String::new();
    emit_schema(&mut buf, schema, 0);
    buf
}

fn emit_schema(buf: &mut String, schema: &ast::Schema, depth: usize) {
    w!(buf, "xcmd::Schema::new()");
    for field in &schema.fields {
        w!(buf, "\n{}.field(", indent(depth + 1));
        emit_field(buf, field, depth + 1);
        w!(buf, ")");
    }
}

fn emit_field(buf: &mut String, field: &ast::Field, depth: usize) {
    match &field.kind {
        ast::FieldKind::Value(ty) => {
            w!(buf, "xcmd::Field::new({:?}, {})", field.ident, gen_ty(ty));
        }
        ast::FieldKind::Group(schema) => {
            w!(buf, "xcmd::Field::group({:?}, ", field.ident);
            emit_schema(buf, schema, depth);
            w!(buf, ")");
        }
    }
    if let Some(tag) = &field.tag {
        w!(buf, ".tag({tag:?})");
    }
    if let Some(doc) = &field.doc {
        w!(buf, ".help({doc:?})");
    }
}

fn gen_ty(ty: &ast::Ty) -> String {
    match ty {
        ast::Ty::Bool => "xcmd::Type::Bool".to_string(),
        ast::Ty::Int => "xcmd::Type::Int".to_string(),
        ast::Ty::Uint => "xcmd::Type::Uint".to_string(),
        ast::Ty::Float => "xcmd::Type::Float".to_string(),
        ast::Ty::String => "xcmd::Type::String".to_string(),
        ast::Ty::Path => "xcmd::Type::Path".to_string(),
        ast::Ty::Named(name) => format!("xcmd::Type::Named({name:?}.to_string())"),
        ast::Ty::List(elem) => format!("xcmd::Type::List(Box::new({}))", gen_ty(elem)),
        ast::Ty::Map(elem) => format!("xcmd::Type::Map(Box::new({}))", gen_ty(elem)),
    }
}

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}
