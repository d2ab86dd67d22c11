mod commands;
mod flags;
mod values;
mod hooks;

use std::fmt::Write;

use expect_test::Expect;
use xcmd::{Bindings, Config, Context, Env, Grammar, Schema};

/// Config with an empty environment, so tests don't see the process one.
fn config() -> Config {
    Config::new("app").env(Env::from_iter(Vec::<(String, String)>::new()))
}

fn grammar(schema: Schema) -> Grammar {
    init_tracing();
    Grammar::build(schema, config()).unwrap()
}

fn check(grammar: &Grammar, args: &str, expect: Expect) {
    let mut bindings = grammar.bindings();
    let actual = match grammar.parse(args.split_ascii_whitespace(), &mut bindings) {
        Ok(ctx) => render(&ctx, &bindings),
        Err(err) => err.to_string(),
    };
    expect.assert_eq(&actual);
}

/// The selected command followed by every slot that was set.
fn render(ctx: &Context<'_>, bindings: &Bindings) -> String {
    let mut buf = format!("command: {}", ctx.command()).trim_end().to_string();
    buf.push('\n');
    for (key, slot) in bindings.iter() {
        if slot.set && !key.is_empty() {
            let _ = writeln!(buf, "{key} = {}", slot.val);
        }
    }
    buf
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
