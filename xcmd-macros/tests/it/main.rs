use expect_test::{expect, Expect};
use xcmd::{Config, Env, Grammar, Schema};

fn check(schema: Schema, expect: Expect) {
    let config = Config::new("app").env(Env::from_iter(Vec::<(String, String)>::new()));
    let grammar = Grammar::build(schema, config).unwrap();
    let mut buf = String::new();
    for (_, node) in grammar.nodes() {
        let depth = std::iter::successors(node.parent, |&it| grammar.node(it).parent).count();
        let indent = "  ".repeat(depth);
        buf.push_str(&format!("{indent}{:?} {}", node.kind, node.summary()));
        if let Some(help) = &node.help {
            buf.push_str(&format!(" # {help}"));
        }
        buf.push('\n');
        for value in node.values() {
            buf.push_str(&format!("{indent}  {}", value.summary()));
            if value.required {
                buf.push_str(" (required)");
            }
            if let Some(help) = &value.help {
                buf.push_str(&format!(" # {help}"));
            }
            buf.push('\n');
        }
    }
    expect.assert_eq(&buf);
}

#[test]
fn smoke() {
    check(
        xcmd::schema! {
            /// Number of parallel jobs.
            jobs: uint "short=j,default=4"
            /// Log file, defaults to `${default}`.
            log_file: path "default=xcmd.log"
            include: [path] "sep=none"
            workspace: path "arg"
        },
        expect![[r#"
            App app
              <workspace> (required)
              --jobs # Number of parallel jobs.
              --log-file # Log file, defaults to `xcmd.log`.
              --include
        "#]],
    );
}

#[test]
fn subcommands() {
    check(
        xcmd::schema! {
            verbose: bool "short=v"
            /// Manage users.
            user "cmd" {
                id "arg" {
                    id: int "arg"
                    /// Remove the user.
                    delete "cmd" {
                        force: bool
                    }
                }
            }
            r#type "cmd,name=kind,help='Inspect things.'" {
                what: string "arg,optional"
            }
        },
        expect![[r#"
            App app
              --verbose
              Command user # Manage users.
                Argument <id>
                  <id> (required)
                  Command delete # Remove the user.
                    --force
              Command kind # Inspect things.
                <what>
        "#]],
    );
}
