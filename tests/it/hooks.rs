use std::sync::{Arc, Mutex};

use xcmd::{Field, HookKind, Schema, Type, Val};

use crate::grammar;

type Log = Arc<Mutex<Vec<String>>>;

fn logged(field: Field, log: &Log, name: &'static str) -> Field {
    let kinds = [
        HookKind::BeforeReset,
        HookKind::BeforeResolve,
        HookKind::BeforeApply,
        HookKind::AfterApply,
    ];
    kinds.into_iter().fold(field, |field, kind| {
        let log = Arc::clone(log);
        field.hook(kind, move |_| {
            log.lock().unwrap().push(format!("{kind:?} {name}"));
            Ok(())
        })
    })
}

#[test]
fn phases() {
    let log = Log::default();
    let g = grammar(
        Schema::new()
            .field(logged(Field::new("verbose", Type::Bool), &log, "verbose"))
            .field(logged(Field::new("quiet", Type::Bool), &log, "quiet"))
            .field(logged(
                Field::group("sync", Schema::new().field(Field::new("all", Type::Bool))).tag("cmd"),
                &log,
                "sync",
            ))
            .field(logged(Field::group("push", Schema::new()).tag("cmd"), &log, "push")),
    );

    let mut bindings = g.bindings();
    g.parse(["sync", "--verbose"], &mut bindings).unwrap();

    // Reset and resolve hooks see the whole grammar, apply hooks only what
    // was matched, in the order it was matched.
    assert_eq!(
        *log.lock().unwrap(),
        [
            "BeforeReset verbose",
            "BeforeReset quiet",
            "BeforeReset sync",
            "BeforeReset push",
            "BeforeResolve verbose",
            "BeforeResolve quiet",
            "BeforeResolve sync",
            "BeforeResolve push",
            "BeforeApply sync",
            "BeforeApply verbose",
            "AfterApply sync",
            "AfterApply verbose",
        ]
    );
}

#[test]
fn hooks_can_rewrite_bindings() {
    let g = grammar(Schema::new().field(Field::new("n", Type::Int).hook(
        HookKind::AfterApply,
        |bindings| {
            if let Some(Val::Int(n)) = bindings.get_mut("n") {
                *n *= 2;
            }
            Ok(())
        },
    )));

    let mut bindings = g.bindings();
    g.parse(["--n", "21"], &mut bindings).unwrap();
    assert_eq!(bindings.get("n"), Some(&Val::Int(42)));

    g.parse(Vec::<String>::new(), &mut bindings).unwrap();
    assert_eq!(bindings.get("n"), Some(&Val::Int(0)));
}

#[test]
fn failing_hook_aborts() {
    let g = grammar(
        Schema::new().field(
            Field::group("deploy", Schema::new())
                .tag("cmd")
                .hook(HookKind::BeforeApply, |_| Err("not allowed on fridays".into())),
        ),
    );

    let mut bindings = g.bindings();
    let err = g.parse(["deploy"], &mut bindings).unwrap_err();
    assert_eq!(err.to_string(), "deploy: not allowed on fridays");
}
