use expect_test::expect;
use xcmd::schema;

use crate::{check, grammar};

#[test]
fn terminator() {
    let g = grammar(schema! {
        force: bool "short=f"
        recursive: bool "short=r"
        paths: [string] "arg,optional"
    });

    check(
        &g,
        "-- ls -lart",
        expect![[r#"
            command: <paths>
            paths = ls,-lart
        "#]],
    );
    check(
        &g,
        "-rf a b",
        expect![[r#"
            command: <paths>
            force = true
            paths = a,b
            recursive = true
        "#]],
    );
    check(&g, "", expect!["command:\n"]);
    check(
        &g,
        "--force=maybe",
        expect![[r#"--force: expected bool but got "maybe" (must be true or false)"#]],
    );
}

#[test]
fn short_bundles() {
    let g = grammar(schema! {
        all: bool "short=a"
        brief: bool "short=b"
        config: string "short=c"
    });

    check(
        &g,
        "-abc X",
        expect![[r#"
            command:
            all = true
            brief = true
            config = X
        "#]],
    );
    check(
        &g,
        "-bcX",
        expect![[r#"
            command:
            brief = true
            config = X
        "#]],
    );
    check(&g, "-c", expect!["--config: expected string value but got `EOL`"]);
    check(&g, "-c -a", expect!["--config: expected string value but got `-a`"]);
    check(&g, "-x", expect!["unknown flag -x"]);
}

#[test]
fn long_values() {
    let g = grammar(schema! {
        name: string
        path: path "aliases=dir"
    });

    check(
        &g,
        "--name=a=b --dir /tmp",
        expect![[r#"
            command:
            name = a=b
            path = /tmp
        "#]],
    );
    check(
        &g,
        "--name first --name second",
        expect![[r#"
            command:
            name = second
        "#]],
    );
    check(&g, "--nmae x", expect![[r#"unknown flag --nmae, did you mean "--name"?"#]]);
    check(&g, "stray", expect![[r#"unexpected positional argument "stray""#]]);
}

#[test]
fn negatable() {
    let g = grammar(schema! {
        cache: bool "negatable,default=true"
    });

    let mut bindings = g.bindings();
    g.parse(Vec::<String>::new(), &mut bindings).unwrap();
    assert_eq!(bindings.get("cache"), Some(&xcmd::Val::Bool(true)));
    assert!(!bindings.is_set("cache"));

    check(
        &g,
        "--no-cache",
        expect![[r#"
            command:
            cache = false
        "#]],
    );
    check(
        &g,
        "--no-cache --cache",
        expect![[r#"
            command:
            cache = true
        "#]],
    );
    check(&g, "--no-cach", expect![[r#"unknown flag --no-cach, did you mean "--no-cache"?"#]]);
}

#[test]
fn counter() {
    let g = grammar(schema! {
        verbose: int "short=v,type=counter"
    });

    check(
        &g,
        "-vvv",
        expect![[r#"
            command:
            verbose = 3
        "#]],
    );
    check(
        &g,
        "--verbose=5 -v",
        expect![[r#"
            command:
            verbose = 6
        "#]],
    );
    check(
        &g,
        "--verbose=9223372036854775807 -v",
        expect!["--verbose: counter overflows past 9223372036854775807"],
    );
}

#[test]
fn lone_dash() {
    let g = grammar(schema! {
        name: string
        input: string "arg,optional"
    });

    check(
        &g,
        "-",
        expect![[r#"
            command: <input>
            input = -
        "#]],
    );
    check(&g, "--name -", expect!["--name: expected string value but got `-`"]);
}

#[test]
fn collections() {
    let g = grammar(schema! {
        include: [string] "short=I"
        exclude: [string] "sep=none"
        label: map[int]
    });

    check(
        &g,
        "-I a,b -I c --exclude x,y --label a=1;b=2 --label a=3",
        expect![[r#"
            command:
            exclude = x,y
            include = a,b,c
            label = a=3;b=2
        "#]],
    );
    check(&g, "--label oops", expect![[r#"--label: expected `key=value` but got "oops""#]]);
    check(
        &g,
        "--label a=one",
        expect![[r#"--label: expected int but got "one" (invalid digit found in string)"#]],
    );
}
