//! Integration tests for the web integration surface.
//!
//! These tests drive handlers the way a framework adapter would: build a
//! request, call the wrapped handler, and turn any error into a response.

use std::sync::Arc;

use param_gate::web::example_handler::{division_view, exponentiation_view, purchase_view};
use param_gate::web::{respond, ErrorResponse, ParamRequest, RequestParams};
use param_gate::{
    Binding, BoxError, ExecutionError, Factory, FailureLog, FailureSink, ParamBox, ParamGate,
    QueryParams, RecordingSink, StatusClass, Validator,
};
use serde_json::json;

fn request(id: &str, pairs: &[(&str, &str)]) -> ParamRequest {
    ParamRequest::with_query(id, pairs.iter().copied())
}

fn recording_log() -> (Arc<RecordingSink>, Arc<FailureLog>) {
    let sink = Arc::new(RecordingSink::new());
    let log = Arc::new(FailureLog::with_sinks([
        sink.clone() as Arc<dyn FailureSink>
    ]));
    (sink, log)
}

#[test]
fn division_full_flow() {
    let ok = request("req-div-001", &[("a", "10"), ("b", "2")]);
    assert_eq!(respond(division_view(&ok)).unwrap(), json!({ "answer": 5 }));

    let zero = request("req-div-002", &[("a", "10"), ("b", "0")]);
    let response = respond(division_view(&zero)).unwrap_err();
    assert_eq!(response.status, 400);
    assert_eq!(response.body, json!({ "error": "Invalid 'b' value: 0." }));

    let missing = request("req-div-003", &[("a", "10")]);
    let response = respond(division_view(&missing)).unwrap_err();
    assert_eq!(
        response.body,
        json!({ "error": "Missing required parameter `b`." })
    );
}

#[test]
fn exponentiation_full_flow() {
    let pow = exponentiation_view();

    let ok = request("req-pow-001", &[("a", "2"), ("b", "0.5")]);
    let answer = pow(&ok).unwrap()["answer"].as_f64().unwrap();
    assert!((answer - std::f64::consts::SQRT_2).abs() < 1e-12);

    let bad_type = request("req-pow-002", &[("a", "two"), ("b", "2")]);
    let response = ErrorResponse::from(pow(&bad_type).unwrap_err());
    assert_eq!(response.class(), StatusClass::BadRequest);
    assert_eq!(
        response.body["error"],
        "Invalid type of the `a` parameter: expected float."
    );

    let overflow = request("req-pow-003", &[("a", "10"), ("b", "400")]);
    let response = ErrorResponse::from(pow(&overflow).unwrap_err());
    assert_eq!(response.status, 500);
    assert_eq!(response.body, json!({ "error": ExecutionError::DETAIL }));
}

#[test]
fn purchase_full_flow() {
    let purchase = purchase_view();

    let ok = request(
        "req-buy-001",
        &[("item_id", "1"), ("price", "5.8"), ("token", "abcdefghijkl")],
    );
    assert_eq!(
        purchase(&ok).unwrap()["success"],
        "Item '1' has been purchased. Check: 5.92$."
    );

    let negative_item = request(
        "req-buy-002",
        &[("item_id", "-3"), ("price", "5"), ("token", "abcdefghijkl")],
    );
    let err = purchase(&negative_item).unwrap_err();
    assert_eq!(err.as_validation().unwrap().name(), "item_id");
    assert_eq!(err.detail()["error"], "Invalid 'item_id' value: -3.");
}

#[test]
fn binding_wrap_with_extra_argument() {
    let handler = Binding::new([("n", Factory::int())]).wrap_with(
        |req: &ParamRequest, scale: i64, p: &ParamBox| -> Result<String, BoxError> {
            Ok(format!("{}:{}", req.request_id(), p.get::<i64>("n")? * scale))
        },
    );

    let req = request("req-scale", &[("n", "21")]);
    assert_eq!(handler(&req, 2).unwrap(), "req-scale:42");
}

#[test]
fn binding_wrap_method() {
    struct Counter {
        base: i64,
    }

    let handler = Binding::new([("step", Factory::int())])
        .validators([("step", Validator::new(|step: &i64| *step > 0))])
        .wrap_method(
            |counter: &Counter, _req: &QueryParams, times: i64, p: &ParamBox| {
                p.get::<i64>("step").map(|step| counter.base + step * times)
            },
        );

    let counter = Counter { base: 100 };
    let params: QueryParams = [("step", "5")].into_iter().collect();
    assert_eq!(handler(&counter, &params, 3).unwrap(), 115);

    let params: QueryParams = [("step", "0")].into_iter().collect();
    assert_eq!(
        handler(&counter, &params, 3).unwrap_err().status(),
        StatusClass::BadRequest
    );
}

#[test]
fn binding_request_wrapper_rewrites_before_validation() {
    let handler = Binding::new([("page", Factory::int())])
        .request_wrapper(|mut params: QueryParams| {
            if let Some(values) = params.remove("p") {
                for value in values {
                    params.insert("page", value);
                }
            }
            params
        })
        .wrap(|_req: &ParamRequest, p: &ParamBox| p.get::<i64>("page").copied());

    let legacy = request("req-legacy", &[("p", "4")]);
    assert_eq!(handler(&legacy).unwrap(), 4);

    let current = request("req-current", &[("page", "7")]);
    assert_eq!(handler(&current).unwrap(), 7);
}

#[test]
fn binding_pre_bound_request() {
    let req = request("req-pre", &[("q", "rust")]);
    let handler = Binding::new([("q", Factory::Identity)])
        .with_request(req)
        .wrap(|req: &ParamRequest, p: &ParamBox| -> Result<String, BoxError> {
            Ok(format!("{} searched {}", req.request_id(), p.raw("q")?))
        });

    assert_eq!(handler().unwrap(), "req-pre searched rust");
    assert_eq!(handler().unwrap(), "req-pre searched rust");
}

#[test]
fn prepared_binding_reused_across_requests() {
    let prepared = Binding::from_gate(ParamGate::new().declare("n", Factory::int()).gt("n", 0_i64))
        .box_all(false)
        .prepare();

    for (raw, valid) in [("1", true), ("0", false), ("x", false), ("9", true)] {
        let req = request("req-loop", &[("n", raw), ("other", "1")]);
        let result = prepared.call(&req, |p| -> Result<usize, BoxError> {
            assert!(!p.contains("other"));
            Ok(p.len())
        });
        assert_eq!(result.is_ok(), valid, "n={raw}");
    }
}

#[test]
fn failure_record_includes_params_and_body() {
    let (sink, log) = recording_log();
    let mut req = request("req-body", &[("a", "1")]);
    req.set_body(r#"{"note":"hello"}"#);

    let handler = Binding::new([("a", Factory::int())])
        .logger(log)
        .wrap(|_req: &ParamRequest, _p: &ParamBox| -> Result<(), std::io::Error> {
            Err(std::io::Error::other("storage unavailable"))
        });

    let response = respond(handler(&req)).unwrap_err();
    assert_eq!(response.status, 500);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].params["a"], "1");
    assert_eq!(records[0].body.as_deref(), Some(r#"{"note":"hello"}"#));
    assert_eq!(records[0].to_json()["origin"], "handler");
    assert!(records[0].trace.is_empty());
}

#[test]
fn handler_panic_becomes_500_and_is_logged() {
    let (sink, log) = recording_log();
    let handler = Binding::new([("a", Factory::int())])
        .logger(log)
        .wrap(|_req: &ParamRequest, _p: &ParamBox| -> Result<(), BoxError> {
            panic!("handler bug")
        });

    let err = handler(&request("req-panic", &[("a", "1")])).unwrap_err();
    assert!(err.as_execution().unwrap().is_panic());
    assert_eq!(sink.len(), 1);
    assert!(sink.records()[0].message.contains("handler bug"));
    assert!(!sink.records()[0].trace.is_empty());
}

#[test]
fn validation_failures_are_not_logged() {
    let (sink, log) = recording_log();
    let handler = Binding::new([("a", Factory::int())])
        .logger(log)
        .wrap(|_req: &ParamRequest, _p: &ParamBox| Ok::<_, BoxError>(()));

    assert!(handler(&request("req-bad", &[("a", "nope")])).is_err());
    assert!(sink.is_empty());
}

#[test]
fn request_params_exposes_query_and_body() {
    let mut req = ParamRequest::new("req-meta");
    req.add_query_param("x", "1");
    req.set_body("payload");

    let source = req.params();
    assert_eq!(source.get("x"), Some("1"));
    assert_eq!(source.names(), ["x"]);
    assert_eq!(source.body(), Some("payload"));
    assert_eq!(req.request_id(), "req-meta");
}
