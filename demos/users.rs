use xcmd::{Config, Grammar, Val};

fn main() {
    let schema = xcmd::schema! {
        /// Print what would happen without doing it.
        dry_run: bool "short=n"
        user "cmd" {
            create "cmd" {
                id: int "arg"
                first: string "arg"
                last: string "arg"
            }
            id "arg" {
                id: int "arg"
                delete "cmd" {}
            }
        }
    };

    let grammar = match Grammar::build(schema, Config::new("users")) {
        Ok(it) => it,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2)
        }
    };
    let mut bindings = grammar.bindings();
    match grammar.parse_env(&mut bindings) {
        Ok(ctx) => {
            let dry_run = bindings.get("dry_run") == Some(&Val::Bool(true));
            let prefix = if dry_run { "would " } else { "" };
            println!("{prefix}run `{}`", ctx.command());
            for (key, slot) in bindings.iter().filter(|(key, slot)| slot.set && !key.is_empty()) {
                println!("  {key} = {}", slot.val);
            }
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1)
        }
    }
}
