mod ast;
mod parse;
mod emit;

/// Expands a compact field tree into `xcmd::Schema` builder calls.
///
/// ```ignore
/// xcmd::schema! {
///     /// Doc comments become help.
///     verbose: bool "short=v"
///     user "cmd" {
///         id: int "arg"
///     }
/// }
/// ```
#[proc_macro]
pub fn schema(_ts: proc_macro::TokenStream) -> proc_macro::TokenStream {
    // Stub out the code, but let rust-analyzer resolve the invocation
    #[cfg(not(test))]
    {
        let text = match parse::schema(_ts) {
            Ok(schema) => emit::emit(&schema),
            Err(err) => format!("compile_error!({:?})", format!("invalid schema syntax, {err}")),
        };
        text.parse().unwrap()
    }
    #[cfg(test)]
    unimplemented!()
}

#[cfg(test)]
pub fn compile(src: &str) -> String {
    use proc_macro2::TokenStream;

    let ts = src.parse::<TokenStream>().unwrap();
    let schema = parse::schema(ts).unwrap();
    emit::emit(&schema)
}
