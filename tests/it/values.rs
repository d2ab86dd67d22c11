use std::collections::BTreeMap;

use expect_test::expect;
use xcmd::{schema, Config, Context, Env, Grammar, Scanner, Slot, TokenType, Val};

use crate::{check, config, grammar};

#[test]
fn default_does_not_satisfy_required() {
    let g = grammar(schema! {
        name: string "required,default=bob"
        port: uint "default=8080"
    });

    let mut bindings = g.bindings();
    let err = g.parse(Vec::<String>::new(), &mut bindings).unwrap_err();
    assert_eq!(err.to_string(), "missing flags: --name");
    assert_eq!(bindings.get("name"), Some(&Val::Str("bob".into())));
    assert_eq!(bindings.get("port"), Some(&Val::Uint(8080)));
    assert!(!bindings.is_set("port"));

    check(
        &g,
        "--name alice",
        expect![[r#"
            command:
            name = alice
        "#]],
    );
}

#[test]
fn missing_flags_are_reported_together() {
    let g = grammar(schema! {
        user: string "required"
        token: string "required"
        deploy "cmd" {
            region: string "required"
        }
    });

    check(&g, "deploy", expect!["missing flags: --user, --token, --region"]);
    check(&g, "--user u deploy --region eu", expect!["missing flags: --token"]);
}

#[test]
fn env_and_resolvers() {
    let schema = || {
        schema! {
            name: string "required,env='APP_NAME,USER_NAME'"
            color: string "default=auto"
        }
    };
    let build = |env: &[(&str, &str)], config_file: &[(&str, &str)]| {
        let env = env.iter().copied().collect::<Env>();
        let file = config_file
            .iter()
            .map(|&(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>();
        Grammar::build(schema(), Config::new("app").env(env).resolver(file)).unwrap()
    };

    let g = build(&[("USER_NAME", "env-user")], &[]);
    check(
        &g,
        "",
        expect![[r#"
            command:
            name = env-user
        "#]],
    );

    let g = build(&[("APP_NAME", "app"), ("USER_NAME", "user")], &[("name", "file")]);
    check(
        &g,
        "",
        expect![[r#"
            command:
            name = app
        "#]],
    );

    let g = build(&[], &[("name", "file"), ("color", "never")]);
    check(
        &g,
        "",
        expect![[r#"
            command:
            color = never
            name = file
        "#]],
    );
    check(
        &g,
        "--name cli",
        expect![[r#"
            command:
            color = never
            name = cli
        "#]],
    );

    let g = build(&[], &[]);
    check(&g, "", expect!["missing flags: --name"]);
}

#[test]
fn command_line_replaces_collections() {
    let env = [("TAGS", "x,y")].into_iter().collect::<Env>();
    let g = Grammar::build(
        schema! {
            tags: [string] "default='a,b',env=TAGS"
            labels: [string] "default='a,b'"
        },
        Config::new("app").env(env),
    )
    .unwrap();

    let mut bindings = g.bindings();
    g.parse(Vec::<String>::new(), &mut bindings).unwrap();
    assert_eq!(bindings.get("labels").map(|it| it.to_string()).as_deref(), Some("a,b"));

    check(
        &g,
        "",
        expect![[r#"
            command:
            tags = x,y
        "#]],
    );
    check(
        &g,
        "--tags z --labels c --tags w",
        expect![[r#"
            command:
            labels = c
            tags = z,w
        "#]],
    );
}

#[test]
fn enums() {
    let g = grammar(schema! {
        color: string "enum='red,green',default=red"
        shades: [string] "enum='light,dark',default=light"
    });

    check(&g, "--color blue", expect![[r#"--color: "blue" must be one of red,green"#]]);
    check(&g, "--shades dark,dim", expect![[r#"--shades: "dim" must be one of light,dark"#]]);
    check(
        &g,
        "--color green --shades dark",
        expect![[r#"
            command:
            color = green
            shades = dark
        "#]],
    );

    let err = Grammar::build(schema! { color: string "enum='red,green',default=blue" }, config())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"application `app`: `color`: invalid default value: "blue" must be one of red,green"#
    );
}

#[test]
fn interpolation() {
    let g = Grammar::build(
        schema! {
            /// Cache directory, ${default} by default.
            cache: path "default=${home}/.cache"
            level: string "enum='${levels}',default=info,help='one of ${enum}'"
        },
        config().var("home", "/root").var("levels", "info,debug"),
    )
    .unwrap();

    let flags = &g.node(g.root()).flags;
    assert_eq!(flags[0].default.as_deref(), Some("/root/.cache"));
    assert_eq!(flags[0].help.as_deref(), Some("Cache directory, /root/.cache by default."));
    assert_eq!(flags[1].enum_values, ["info", "debug"]);
    assert_eq!(flags[1].help.as_deref(), Some("one of info,debug"));

    let err = Grammar::build(schema! { cache: path "default=${home}" }, config()).unwrap_err();
    assert_eq!(err.to_string(), "application `app`: `cache`: undefined variable ${home}");
}

#[test]
fn reset_matches_fresh_decode() {
    let g = grammar(schema! {
        port: int "default=8080"
        tags: [string] "default='a,b'"
        env: map[string] "default='a=1;b=2'"
        ratio: float "default=0.5"
    });

    for flag in &g.node(g.root()).flags {
        let default = flag.default.clone().unwrap();

        let mut reset = Slot { val: Val::Bool(true), set: true };
        flag.reset(&mut reset).unwrap();
        assert!(!reset.set);

        let mut fresh = g.bindings().slot(flag.target).clone();
        let mut scan = Scanner::typed(TokenType::FlagValue, [default.as_str()]);
        flag.parse(&mut scan, &mut fresh).unwrap();

        assert_eq!(reset.val, fresh.val, "{}", flag.name);
    }
}

#[test]
fn failed_parse_keeps_earlier_values() {
    let g = grammar(schema! {
        verbose: bool
        count: int
    });

    let mut bindings = g.bindings();
    let mut ctx = Context::new(&g, ["--verbose", "--count", "x"]);
    let err = ctx.run(&mut bindings).unwrap_err();

    assert_eq!(
        err.to_string(),
        r#"--count: expected int but got "x" (invalid digit found in string)"#
    );
    assert_eq!(bindings.get("verbose"), Some(&Val::Bool(true)));
    assert!(bindings.is_set("verbose"));
    assert!(!bindings.is_set("count"));
    assert_eq!(ctx.path().len(), 2);
}

#[test]
fn bindings_are_reused_across_parses() {
    let g = grammar(schema! {
        tags: [string]
        verbose: bool
    });

    let mut bindings = g.bindings();
    g.parse(["--tags", "a", "--verbose"], &mut bindings).unwrap();
    g.parse(["--tags", "b"], &mut bindings).unwrap();

    assert_eq!(bindings.get("tags"), Some(&Val::List(vec![Val::Str("b".into())])));
    assert_eq!(bindings.get("verbose"), Some(&Val::Bool(false)));
}

#[test]
fn custom_decoders() {
    #[derive(Debug)]
    struct Seconds;

    impl xcmd::Decoder for Seconds {
        fn decode(
            &self,
            ctx: &mut xcmd::DecodeContext<'_>,
            target: &mut Val,
        ) -> Result<(), xcmd::DecodeError> {
            let token = ctx.scan.pop_value("duration")?;
            let secs = match token.value.strip_suffix('m') {
                Some(mins) => xcmd::from_str::<u64>("duration", mins)? * 60,
                None => xcmd::from_str("duration", token.value.trim_end_matches('s'))?,
            };
            *target = Val::Uint(secs);
            Ok(())
        }

        fn zero(&self) -> Val {
            Val::Uint(0)
        }
    }

    let g = Grammar::build(
        schema! {
            timeout: Duration "default=30s"
            retry: uint "type=Duration"
        },
        config().decoder("Duration", Seconds),
    )
    .unwrap();
    check(
        &g,
        "--retry 2m",
        expect![[r#"
            command:
            retry = 120
        "#]],
    );

    let mut bindings = g.bindings();
    g.parse(Vec::<String>::new(), &mut bindings).unwrap();
    assert_eq!(bindings.get("timeout"), Some(&Val::Uint(30)));
}

#[test]
fn decoder_leaving_flag_value() {
    #[derive(Debug)]
    struct Switch;

    impl xcmd::Decoder for Switch {
        fn decode(
            &self,
            _ctx: &mut xcmd::DecodeContext<'_>,
            target: &mut Val,
        ) -> Result<(), xcmd::DecodeError> {
            *target = Val::Bool(true);
            Ok(())
        }

        fn zero(&self) -> Val {
            Val::Bool(false)
        }
    }

    let g = Grammar::build(schema! { loud: Switch }, config().decoder("Switch", Switch)).unwrap();
    check(
        &g,
        "--loud",
        expect![[r#"
            command:
            loud = true
        "#]],
    );
    check(&g, "--loud=x", expect![[r#"unexpected flag argument "x""#]]);
}

#[test]
fn failing_resolver() {
    #[derive(Debug)]
    struct Unreadable;

    impl xcmd::Resolver for Unreadable {
        fn resolve(&self, _flag: &xcmd::Flag) -> Result<Option<String>, xcmd::BoxError> {
            Err("config file is not readable".into())
        }
    }

    let g = Grammar::build(schema! { name: string }, config().resolver(Unreadable)).unwrap();
    let mut bindings = g.bindings();
    let err = g.parse(["--name", "x"], &mut bindings).unwrap_err();
    assert!(matches!(err, xcmd::ParseError::Resolve { .. }));
    assert_eq!(err.to_string(), "--name: resolving value: config file is not readable");
}
