//! Example handlers showing the three ways to drive validation from a web
//! endpoint.
//!
//! **These examples are for documentation and testing only.** They take a
//! [`ParamRequest`] directly instead of a real framework request.
//!
//! - [`division_view`] calls [`validate`] inline.
//! - [`exponentiation_view`] is a handler wrapped by a [`Binding`].
//! - [`purchase_view`] uses a custom factory and per-parameter validators.

use serde_json::{json, Value};
use thiserror::Error as ThisError;

use crate::binding::Binding;
use crate::error::{BoxError, Error, FactoryError};
use crate::factory::Factory;
use crate::gate::validate;
use crate::param_box::ParamBox;
use crate::validator::Validator;

use super::ParamRequest;

/// Arithmetic overflowed while computing a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
#[error("numerical result out of range")]
pub struct Overflow;

/// Failure inside an example handler body.
#[derive(Debug, ThisError)]
pub enum HandlerError {
    /// A box lookup failed.
    #[error(transparent)]
    Lookup(#[from] BoxError),
    /// Arithmetic overflowed.
    #[error(transparent)]
    Overflow(#[from] Overflow),
}

/// `GET /api/divide?a=<int>&b=<int, nonzero>` → `{"answer": a // b}`.
///
/// Division floors toward negative infinity.
///
/// # Examples
///
/// ```
/// use param_gate::web::{example_handler::division_view, ParamRequest};
///
/// let request = ParamRequest::with_query("req-1", [("a", "10"), ("b", "2"), ("token", "abcdefghijkl")]);
/// assert_eq!(division_view(&request).unwrap()["answer"], 5);
///
/// let request = ParamRequest::with_query("req-2", [("a", "10"), ("b", "0")]);
/// assert_eq!(division_view(&request).unwrap_err().status().code(), 400);
/// ```
pub fn division_view(request: &ParamRequest) -> Result<Value, Error> {
    validate(request)
        .declare("a", Factory::int())
        .declare("b", Factory::int())
        .nonzero("b")
        .run(|p| -> Result<Value, HandlerError> {
            let answer = floor_div(*p.get::<i64>("a")?, *p.get::<i64>("b")?)?;
            Ok(json!({ "answer": answer }))
        })
}

/// `GET /api/pow?a=<float>&b=<float>` → `{"answer": a ** b}`.
///
/// A result that does not fit in an `f64` is an internal failure (500).
pub fn exponentiation_view() -> impl Fn(&ParamRequest) -> Result<Value, Error> {
    Binding::new([("a", Factory::float()), ("b", Factory::float())]).wrap(
        |_request: &ParamRequest, p: &ParamBox| -> Result<Value, HandlerError> {
            let answer = p.get::<f64>("a")?.powf(*p.get::<f64>("b")?);
            if answer.is_infinite() {
                return Err(Overflow.into());
            }
            Ok(json!({ "answer": answer }))
        },
    )
}

/// `GET /api/purchase?item_id=<int, >= 0>&price=<decimal, > 0>&token=<12 chars>`.
///
/// Applies a 2% tax to the price and reports the rounded total.
pub fn purchase_view() -> impl Fn(&ParamRequest) -> Result<Value, Error> {
    Binding::new([
        ("price", Factory::new(parse_cents).named("decimal")),
        ("item_id", Factory::int()),
        ("token", Factory::Identity),
    ])
    .validators([
        ("price", Validator::new(|cents: &u64| *cents > 0)),
        ("token", Validator::new(|token: &String| token.len() == 12)),
        ("item_id", Validator::new(|id: &i64| *id >= 0)),
    ])
    .wrap(
        |_request: &ParamRequest, p: &ParamBox| -> Result<Value, HandlerError> {
            let cents = *p.get::<u64>("price")?;
            let total = cents
                .checked_mul(102)
                .and_then(|taxed| taxed.checked_add(50))
                .ok_or(Overflow)?
                / 100;
            Ok(json!({
                "success": format!(
                    "Item '{}' has been purchased. Check: {}.{:02}$.",
                    p.get::<i64>("item_id")?,
                    total / 100,
                    total % 100
                )
            }))
        },
    )
}

/// Parses a non-negative decimal amount with at most two fraction digits
/// into cents.
fn parse_cents(raw: &str) -> Result<u64, FactoryError> {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FactoryError::rejected("expected at most two decimal places"));
    }

    let whole: u64 = whole.parse()?;
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<2}").parse()?
    };

    whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(fraction))
        .ok_or_else(|| FactoryError::rejected("amount too large"))
}

fn floor_div(a: i64, b: i64) -> Result<i64, Overflow> {
    let quotient = a.checked_div(b).ok_or(Overflow)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutionError, FaultOrigin};

    fn request(pairs: &[(&str, &str)]) -> ParamRequest {
        ParamRequest::with_query("req-test", pairs.iter().copied())
    }

    #[test]
    fn divide_floors() {
        let answer = division_view(&request(&[("a", "-7"), ("b", "2")])).unwrap();
        assert_eq!(answer["answer"], -4);
    }

    #[test]
    fn divide_rejects_zero_with_default_message() {
        let err = division_view(&request(&[("a", "10"), ("b", "0")])).unwrap_err();
        assert_eq!(
            err.detail(),
            json!({ "error": "Invalid 'b' value: 0." })
        );
    }

    #[test]
    fn divide_overflow_is_internal() {
        let err = division_view(&request(&[("a", &i64::MIN.to_string()), ("b", "-1")]))
            .unwrap_err();
        let exec = err.as_execution().unwrap();
        assert_eq!(exec.origin(), &FaultOrigin::Handler);
        assert_eq!(err.detail(), json!({ "error": ExecutionError::DETAIL }));
    }

    #[test]
    fn pow_computes() {
        let pow = exponentiation_view();
        let answer = pow(&request(&[("a", "2"), ("b", "3")])).unwrap();
        assert_eq!(answer["answer"], 8.0);
    }

    #[test]
    fn pow_overflow_is_internal() {
        let pow = exponentiation_view();
        let err = pow(&request(&[("a", "2"), ("b", "3000000000000")])).unwrap_err();
        assert_eq!(err.status().code(), 500);
    }

    #[test]
    fn purchase_reports_taxed_total() {
        let purchase = purchase_view();
        let answer = purchase(&request(&[
            ("item_id", "1"),
            ("price", "5.8"),
            ("token", "abcdefghijkl"),
        ]))
        .unwrap();
        assert_eq!(
            answer["success"],
            "Item '1' has been purchased. Check: 5.92$."
        );
    }

    #[test]
    fn purchase_validates_each_parameter() {
        let purchase = purchase_view();

        let err = purchase(&request(&[
            ("item_id", "1"),
            ("price", "0"),
            ("token", "abcdefghijkl"),
        ]))
        .unwrap_err();
        assert_eq!(err.as_validation().unwrap().name(), "price");

        let err = purchase(&request(&[
            ("item_id", "1"),
            ("price", "1.999"),
            ("token", "abcdefghijkl"),
        ]))
        .unwrap_err();
        assert_eq!(
            err.detail()["error"],
            "Invalid type of the `price` parameter: expected decimal."
        );

        let err = purchase(&request(&[("item_id", "1"), ("price", "1"), ("token", "short")]))
            .unwrap_err();
        assert_eq!(err.as_validation().unwrap().name(), "token");
    }

    #[test]
    fn parse_cents_variants() {
        assert_eq!(parse_cents("5").unwrap(), 500);
        assert_eq!(parse_cents("5.8").unwrap(), 580);
        assert_eq!(parse_cents("0.05").unwrap(), 5);
        assert!(parse_cents("5.").is_ok());
        assert!(parse_cents("-1").is_err());
        assert!(parse_cents("1.2.3").is_err());
        assert!(parse_cents("abc").is_err());
    }

    #[test]
    fn floor_div_matches_floor_semantics() {
        assert_eq!(floor_div(7, 2), Ok(3));
        assert_eq!(floor_div(-7, 2), Ok(-4));
        assert_eq!(floor_div(7, -2), Ok(-4));
        assert_eq!(floor_div(-8, 2), Ok(-4));
        assert_eq!(floor_div(i64::MIN, -1), Err(Overflow));
    }
}
