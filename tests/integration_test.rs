use std::collections::HashMap;
use std::sync::Arc;

use param_gate::{
    validate, BoxError, CheckError, ConversionError, Error, ExecutionError, Factory,
    FactoryError, FailureCause, FailureLog, FailureSink, FaultOrigin, ParamGate, QueryParams,
    RecordingSink, Settings, StatusClass, Validator,
};

fn params(pairs: &[(&str, &str)]) -> QueryParams {
    pairs.iter().copied().collect()
}

fn recording_log() -> (Arc<RecordingSink>, Arc<FailureLog>) {
    let sink = Arc::new(RecordingSink::new());
    let log = Arc::new(FailureLog::with_sinks([
        sink.clone() as Arc<dyn FailureSink>
    ]));
    (sink, log)
}

fn division_gate() -> ParamGate {
    ParamGate::new()
        .declare("a", Factory::int())
        .declare("b", Factory::int())
        .nonzero("b")
        .eq_by("token", 12, |token: &String| token.len())
}

#[test]
fn end_to_end_valid_request() {
    let source = params(&[("a", "10"), ("b", "2"), ("token", "abcdefghijkl")]);
    let p = division_gate().freeze().evaluate(&source).unwrap();

    assert_eq!(p.get::<i64>("a"), Ok(&10));
    assert_eq!(p.get::<i64>("b"), Ok(&2));
    assert_eq!(p.raw("token"), Ok("abcdefghijkl"));
    assert_eq!(p.names().collect::<Vec<_>>(), ["a", "b", "token"]);
}

#[test]
fn end_to_end_zero_divisor_is_rejected() {
    let source = params(&[("a", "10"), ("b", "0"), ("token", "abcdefghijkl")]);
    let err = division_gate().freeze().evaluate(&source).unwrap_err();

    let err = err.as_validation().unwrap();
    assert_eq!(err.name(), "b");
    assert_eq!(err.raw_value(), Some("0"));
    assert_eq!(err.to_string(), "Invalid 'b' value: 0.");
}

#[test]
fn identity_parameters_keep_raw_string() {
    let source = params(&[("q", "  spaced  out ")]);
    let p = ParamGate::new()
        .declare("q", Factory::Identity)
        .freeze()
        .evaluate(&source)
        .unwrap();
    assert_eq!(p.raw("q"), Ok("  spaced  out "));
}

#[test]
fn missing_declared_parameter() {
    let err = validate(&params(&[("a", "1")]))
        .declare("a", Factory::int())
        .declare("b", Factory::int())
        .run(|_| Ok::<_, BoxError>(()))
        .unwrap_err();

    assert_eq!(err.status(), StatusClass::BadRequest);
    assert_eq!(
        err.as_validation().unwrap().cause(),
        &FailureCause::Conversion(ConversionError::Missing {
            name: "b".to_string()
        })
    );
    assert_eq!(
        err.detail(),
        serde_json::json!({ "error": "Missing required parameter `b`." })
    );
}

#[test]
fn first_failure_in_declaration_order_wins() {
    let err = validate(&params(&[("b", "x"), ("a", "y")]))
        .declare("a", Factory::int())
        .declare("b", Factory::int())
        .run(|_| Ok::<_, BoxError>(()))
        .unwrap_err();
    assert_eq!(err.as_validation().unwrap().name(), "a");
}

#[test]
fn box_all_disabled_hides_undeclared() {
    let source = params(&[("a", "1"), ("b", "2")]);
    let p = ParamGate::new()
        .declare("a", Factory::int())
        .box_all(false)
        .freeze()
        .evaluate(&source)
        .unwrap();

    assert!(!p.contains("b"));
    assert_eq!(
        p.get::<String>("b"),
        Err(BoxError::UnknownAttribute {
            name: "b".to_string()
        })
    );
}

#[test]
fn undeclared_follow_declared_in_source_order() {
    let source = params(&[("z", "1"), ("a", "2"), ("m", "3")]);
    let p = ParamGate::new()
        .declare("a", Factory::int())
        .freeze()
        .evaluate(&source)
        .unwrap();
    assert_eq!(p.names().collect::<Vec<_>>(), ["a", "z", "m"]);
    assert_eq!(p.raw("m"), Ok("3"));
}

#[test]
fn predicate_custom_message_is_verbatim() {
    let err = validate(&params(&[("page", "-1")]))
        .declare("page", Factory::int())
        .predicate_with("page", |page: &i64| *page >= 1, "pages start at 1")
        .run(|_| Ok::<_, BoxError>(()))
        .unwrap_err();
    assert_eq!(err.to_string(), "pages start at 1");
    assert_eq!(err.as_validation().unwrap().raw_value(), Some("-1"));
}

#[test]
fn try_predicate_can_reject_or_pass() {
    let gate = || {
        ParamGate::new()
            .declare("limit", Factory::parse::<u32>())
            .try_predicate("limit", |limit: &u32| {
                if *limit <= 100 {
                    Ok(())
                } else {
                    Err(CheckError::rejected(format!("limit {limit} exceeds 100")))
                }
            })
            .freeze()
    };

    assert!(gate().evaluate(&params(&[("limit", "100")])).is_ok());
    let err = gate().evaluate(&params(&[("limit", "101")])).unwrap_err();
    assert_eq!(err.to_string(), "limit 101 exceeds 100");
}

#[test]
fn combinators_gt_lt_positive() {
    let schema = ParamGate::new()
        .declare("n", Factory::int())
        .gt("n", 1_i64)
        .lt("n", 10_i64)
        .declare("x", Factory::float())
        .positive("x")
        .declare("name", Factory::Identity)
        .gt_by("name", 2, |name: &String| name.len())
        .lt_by("name", 6, |name: &String| name.len())
        .freeze();

    let ok = params(&[("n", "5"), ("x", "0"), ("name", "abc")]);
    assert!(schema.evaluate(&ok).is_ok());

    for (bad, name) in [
        (params(&[("n", "1"), ("x", "0"), ("name", "abc")]), "n"),
        (params(&[("n", "10"), ("x", "0"), ("name", "abc")]), "n"),
        (params(&[("n", "5"), ("x", "-0.5"), ("name", "abc")]), "x"),
        (params(&[("n", "5"), ("x", "1"), ("name", "ab")]), "name"),
        (params(&[("n", "5"), ("x", "1"), ("name", "abcdef")]), "name"),
    ] {
        let err = schema.evaluate(&bad).unwrap_err();
        assert_eq!(err.as_validation().unwrap().name(), name);
    }
}

#[test]
fn nonzero_by_and_positive_by_use_transform() {
    let schema = ParamGate::new()
        .nonzero_by("tags", |tags: &String| tags.split(',').filter(|t| !t.is_empty()).count())
        .positive_by("delta", |delta: &String| delta.parse::<i32>().unwrap_or(-1))
        .freeze();

    assert!(schema
        .evaluate(&params(&[("tags", "a,b"), ("delta", "0")]))
        .is_ok());
    assert_eq!(
        schema
            .evaluate(&params(&[("tags", ","), ("delta", "0")]))
            .unwrap_err()
            .as_validation()
            .unwrap()
            .name(),
        "tags"
    );
    assert_eq!(
        schema
            .evaluate(&params(&[("tags", "a"), ("delta", "x")]))
            .unwrap_err()
            .as_validation()
            .unwrap()
            .name(),
        "delta"
    );
}

#[test]
fn validators_run_in_declared_order() {
    let err = validate(&params(&[("n", "0")]))
        .declare("n", Factory::int())
        .validator(
            "n",
            Validator::try_new(|_: &i64| Err(CheckError::rejected("first")))
                .try_and(|_: &i64| Err(CheckError::rejected("second"))),
        )
        .run(|_| Ok::<_, BoxError>(()))
        .unwrap_err();
    assert_eq!(err.to_string(), "first");
}

#[test]
fn user_error_becomes_execution_error_and_is_logged_once() {
    let (sink, log) = recording_log();
    let source = params(&[("a", "10"), ("b", "2"), ("token", "abcdefghijkl")]);

    let err = division_gate()
        .bind(&source)
        .logger(log)
        .run(|_| Err::<(), _>(std::io::Error::other("connection refused")))
        .unwrap_err();

    assert_eq!(err.status(), StatusClass::InternalServerError);
    assert_eq!(
        err.detail(),
        serde_json::json!({ "error": ExecutionError::DETAIL })
    );

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].origin, "handler");
    assert_eq!(records[0].params["token"], "abcdefghijkl");
    assert!(records[0].message.contains("connection refused"));
}

#[test]
fn success_returns_result_unchanged() {
    let (sink, log) = recording_log();
    let source = params(&[("a", "10"), ("b", "3"), ("token", "abcdefghijkl")]);

    let result: Result<Vec<i64>, Error> = division_gate()
        .bind(&source)
        .logger(log)
        .run(|p| -> Result<_, BoxError> {
            let a = *p.get::<i64>("a")?;
            let b = *p.get::<i64>("b")?;
            Ok(vec![a / b, a % b])
        });

    assert_eq!(result.unwrap(), [3, 1]);
    assert!(sink.is_empty());
}

#[test]
fn factory_internal_failure_is_execution_not_validation() {
    let (sink, log) = recording_log();
    let source = params(&[("user", "42")]);

    let err = ParamGate::new()
        .declare(
            "user",
            Factory::new(|_: &str| -> Result<String, FactoryError> {
                Err(FactoryError::internal(std::io::Error::other("user store offline")))
            }),
        )
        .bind(&source)
        .logger(log)
        .run(|_| Ok::<_, BoxError>(()))
        .unwrap_err();

    let exec = err.as_execution().unwrap();
    assert_eq!(
        exec.origin(),
        &FaultOrigin::Factory {
            param: "user".to_string()
        }
    );
    assert_eq!(sink.len(), 1);
}

#[test]
fn unknown_attribute_inside_user_code_is_execution_error() {
    let (sink, log) = recording_log();
    let source = params(&[("a", "1")]);

    let err = validate(&source)
        .declare("a", Factory::int())
        .box_all(false)
        .logger(log)
        .run(|p| p.get::<i64>("missing").copied())
        .unwrap_err();

    let exec = err.as_execution().unwrap();
    assert_eq!(
        exec.downcast_ref::<BoxError>(),
        Some(&BoxError::UnknownAttribute {
            name: "missing".to_string()
        })
    );
    assert_eq!(sink.len(), 1);
}

#[test]
fn schema_reuse_across_sources() {
    let schema = division_gate().freeze();
    let valid = params(&[("a", "9"), ("b", "3"), ("token", "abcdefghijkl")]);
    let invalid = params(&[("a", "9"), ("b", "0"), ("token", "abcdefghijkl")]);

    assert!(schema.check(&valid).unwrap().is_valid());
    assert!(!schema.check(&invalid).unwrap().is_valid());
    assert!(schema.check(&valid).unwrap().is_valid());
}

#[test]
fn hashmap_sources_work() {
    let mut source = HashMap::new();
    source.insert("n".to_string(), "7".to_string());

    let n = validate(&source)
        .declare("n", Factory::int())
        .run(|p| p.get::<i64>("n").copied())
        .unwrap();
    assert_eq!(n, 7);
}

#[test]
fn settings_configure_gates() {
    let settings = Settings::from_lookup(|var| {
        (var == param_gate::BOX_ALL_VAR).then(|| "no".to_string())
    })
    .unwrap();

    let p = settings
        .gate()
        .declare("a", Factory::int())
        .freeze()
        .evaluate(&params(&[("a", "1"), ("extra", "x")]))
        .unwrap();
    assert!(!p.contains("extra"));
}
