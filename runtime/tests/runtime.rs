use stick_runtime::{Context, Env, RuntimeError, Value, coerce_bool, equal, get_attr, iterate, lookup};

fn user() -> Value {
    Value::map([("name", Value::from("Ann")), ("age", Value::from(31))])
}

#[test]
fn lookup_missing_is_null() {
    let ctx = Context::from([("user".to_string(), user())]);
    assert_eq!(lookup(&ctx, "user"), user());
    assert_eq!(lookup(&ctx, "nobody"), Value::Null);
}

#[test]
fn attribute_lookup_on_maps() {
    assert_eq!(get_attr(&user(), &Value::from("name")), Ok(Value::from("Ann")));
    assert_eq!(
        get_attr(&user(), &Value::from("email")),
        Err(RuntimeError::NoSuchAttribute {
            attribute: "email".into(),
            type_name: "Map".into(),
        })
    );
}

#[test]
fn attribute_lookup_on_arrays() {
    let items = Value::from(vec!["a", "b"]);
    assert_eq!(get_attr(&items, &Value::from(1)), Ok(Value::from("b")));
    assert_eq!(get_attr(&items, &Value::from("0")), Ok(Value::from("a")));
    assert_eq!(
        get_attr(&items, &Value::from(5)),
        Err(RuntimeError::IndexOutOfBounds(5))
    );
    assert!(matches!(
        get_attr(&items, &Value::from("first")),
        Err(RuntimeError::TypeError { .. })
    ));
}

#[test]
fn attribute_lookup_on_scalars_fails() {
    let err = get_attr(&Value::Null, &Value::from("name")).unwrap_err();
    assert_eq!(err.to_string(), "Null has no attribute 'name'");
}

#[test]
fn truthiness() {
    assert!(!coerce_bool(&Value::Null));
    assert!(!coerce_bool(&Value::from(false)));
    assert!(coerce_bool(&Value::from(true)));
    assert!(!coerce_bool(&Value::from(0)));
    assert!(coerce_bool(&Value::from(2.5)));
    assert!(!coerce_bool(&Value::from("")));
    assert!(!coerce_bool(&Value::from("0")));
    assert!(coerce_bool(&Value::from("no")));
    assert!(!coerce_bool(&Value::Array(vec![])));
    assert!(coerce_bool(&user()));
}

#[test]
fn iterate_array_with_loop_state() {
    let items = Value::from(vec!["a", "b", "c"]);
    let mut seen = Vec::new();
    iterate(&items, |key, val, lp| {
        seen.push(format!("{}={} {}/{} first={} last={}", key, val, lp.index, lp.length, lp.first, lp.last));
        Ok(false)
    })
    .unwrap();
    assert_eq!(
        seen,
        vec![
            "0=a 1/3 first=true last=false",
            "1=b 2/3 first=false last=false",
            "2=c 3/3 first=false last=true",
        ]
    );
}

#[test]
fn iterate_map_in_key_order() {
    let mut keys = Vec::new();
    iterate(&user(), |key, _, _| {
        keys.push(key.to_string());
        Ok(false)
    })
    .unwrap();
    assert_eq!(keys, vec!["age", "name"]);
}

#[test]
fn iterate_breaks_early() {
    let items = Value::from(vec![1, 2, 3, 4]);
    let mut count = 0;
    iterate(&items, |_, val, _| {
        count += 1;
        Ok(val == Value::from(2))
    })
    .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn iterate_propagates_body_errors() {
    let items = Value::from(vec![1, 2]);
    let result = iterate(&items, |_, _, _| Err(RuntimeError::Custom("boom".into())));
    assert_eq!(result, Err(RuntimeError::Custom("boom".into())));
}

#[test]
fn iterate_null_and_scalars() {
    let mut called = false;
    iterate(&Value::Null, |_, _, _| {
        called = true;
        Ok(false)
    })
    .unwrap();
    assert!(!called);
    assert_eq!(
        iterate(&Value::from("abc"), |_, _, _| Ok(false)),
        Err(RuntimeError::NotIterable("String".into()))
    );
}

#[test]
fn loose_equality() {
    assert!(equal(&Value::from("admin"), &Value::from("admin")));
    assert!(!equal(&Value::from("admin"), &Value::from("user")));
    assert!(equal(&Value::from(1), &Value::from("1")));
    assert!(equal(&Value::from("2.0"), &Value::from(2)));
    assert!(equal(&Value::from(true), &Value::from("yes")));
    assert!(!equal(&Value::from(false), &Value::from(1)));
    assert!(equal(&Value::Null, &Value::from("")));
    assert!(equal(&Value::Null, &Value::Null));
    assert!(!equal(&Value::Null, &Value::from(0)));
    assert!(equal(&user(), &user()));
}

#[test]
fn display_formats() {
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::from(3.0).to_string(), "3");
    assert_eq!(Value::from(2.5).to_string(), "2.5");
    assert_eq!(Value::from(vec![1, 2]).to_string(), "1, 2");
    assert_eq!(user().to_string(), "age: 31, name: Ann");
}

#[test]
fn env_function_table() {
    let env = Env::new().with_function("upper", |_, arg| Value::from(arg.to_string().to_uppercase()));
    let upper = env.functions.get("upper").expect("registered");
    assert_eq!(upper(None, &Value::from("hi")), Value::from("HI"));
    assert!(env.functions.get("lower").is_none());
    assert_eq!(format!("{:?}", env), "Env { functions: [\"upper\"] }");
}

#[test]
fn loop_state_as_value() {
    let mut rendered = Vec::new();
    iterate(&Value::from(vec!["x", "y"]), |_, _, lp| {
        let state = Value::from(lp);
        rendered.push(format!(
            "{}:{}",
            get_attr(&state, &Value::from("index"))?,
            get_attr(&state, &Value::from("last"))?.is_truthy()
        ));
        Ok(false)
    })
    .unwrap();
    assert_eq!(rendered, vec!["1:false", "2:true"]);
}
