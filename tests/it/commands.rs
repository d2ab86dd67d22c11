use expect_test::expect;
use xcmd::{schema, Match, NodeKind, Val};

use crate::{check, grammar};

#[test]
fn nested_commands() {
    let g = grammar(schema! {
        user "cmd" {
            create "cmd" {
                id: int "arg"
                first: string "arg"
                last: string "arg"
            }
        }
    });

    check(
        &g,
        "user create 10 Alec Thomas",
        expect![[r#"
            command: user create <id> <first> <last>
            user = true
            user.create = true
            user.create.first = Alec
            user.create.id = 10
            user.create.last = Thomas
        "#]],
    );
    check(&g, "user create 10", expect!["missing positional arguments <first> <last>"]);
    check(&g, "user", expect![[r#"expected "create""#]]);
    check(&g, "", expect![[r#"expected "user""#]]);
    check(&g, "user delete", expect![[r#"unexpected positional argument "delete""#]]);
    check(
        &g,
        "user create ten Alec Thomas",
        expect![[r#"<id>: expected int but got "ten" (invalid digit found in string)"#]],
    );
}

#[test]
fn branching_argument() {
    let g = grammar(schema! {
        user "cmd" {
            id "arg" {
                id: int "arg"
                delete "cmd" {}
                rename "cmd" { to: string "arg" }
            }
        }
    });

    check(
        &g,
        "user 10 delete",
        expect![[r#"
            command: user <id> delete
            user = true
            user.id = true
            user.id.delete = true
            user.id.id = 10
        "#]],
    );
    check(
        &g,
        "user 10 rename bob",
        expect![[r#"
            command: user <id> rename <to>
            user = true
            user.id = true
            user.id.id = 10
            user.id.rename = true
            user.id.rename.to = bob
        "#]],
    );
    check(&g, "user", expect![[r#"expected "<id>""#]]);
    check(&g, "user 10", expect![[r#"expected one of "delete", "rename""#]]);
    check(&g, "user x delete", expect![[r#"unexpected positional argument "x""#]]);
}

#[test]
fn commands_before_arguments() {
    // Children are tried in declaration order: `list` is a command, anything
    // else that decodes as a string is a name.
    let g = grammar(schema! {
        list "cmd" {}
        name "arg" {
            name: string "arg"
            show "cmd" {}
        }
    });

    check(
        &g,
        "list",
        expect![[r#"
            command: list
            list = true
        "#]],
    );
    check(
        &g,
        "alice show",
        expect![[r#"
            command: <name> show
            name = true
            name.name = alice
            name.show = true
        "#]],
    );
}

#[test]
fn aliases_and_hidden() {
    let g = grammar(schema! {
        remove "cmd,aliases='rm,del'" {}
        debug "cmd,hidden" {}
        list "cmd" {}
    });

    check(
        &g,
        "rm",
        expect![[r#"
            command: remove
            remove = true
        "#]],
    );
    check(
        &g,
        "debug",
        expect![[r#"
            command: debug
            debug = true
        "#]],
    );
    check(&g, "", expect![[r#"expected one of "remove", "list""#]]);
}

#[test]
fn inherited_flags() {
    let g = grammar(schema! {
        verbose: bool "short=v"
        build "cmd" {
            release: bool
        }
    });

    check(
        &g,
        "build -v --release",
        expect![[r#"
            command: build
            build = true
            build.release = true
            verbose = true
        "#]],
    );
    check(&g, "--release build", expect!["unknown flag --release"]);
}

#[test]
fn matches_in_order() {
    let g = grammar(schema! {
        verbose: bool
        user "cmd" {
            id "arg" {
                id: int "arg"
                delete "cmd" { force: bool }
            }
        }
    });
    let mut bindings = g.bindings();
    let ctx = g.parse(["--verbose", "user", "7", "delete", "--force"], &mut bindings).unwrap();

    let shape = ctx
        .matches()
        .into_iter()
        .map(|it| match it {
            Match::App(node) => format!("app {}", node.name),
            Match::Command(node) => format!("command {}", node.name),
            Match::Argument(node) => format!("argument {}", node.summary()),
            Match::Positional(value) => format!("positional {}", value.summary()),
            Match::Flag(flag) => format!("flag {}", flag.summary()),
        })
        .collect::<Vec<_>>();
    assert_eq!(
        shape,
        [
            "app app",
            "flag --verbose",
            "command user",
            "argument <id>",
            "command delete",
            "flag --force",
        ]
    );
    assert_eq!(ctx.selected().name, "delete");
    assert_eq!(ctx.selected().kind, NodeKind::Command);
    assert_eq!(ctx.flags().len(), 2);
    assert_eq!(bindings.get("user.id.id"), Some(&Val::Int(7)));
}
