//! Best-effort number detection for M string arguments
//!
//! M passes everything as strings. The coerced call variant turns arguments
//! that look numeric into Python numbers and leaves everything else as bytes.
//! Nothing here ever fails: text that merely resembles a number (`1.2.3`)
//! degrades to the original bytes.

use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyLong};

/// An argument after the numeric heuristic has run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced<'a> {
    Int(i64),
    /// Integral text too large for `i64`; handed to Python's `int()` as-is.
    BigInt(&'a str),
    Float(f64),
    Bytes(&'a [u8]),
}

fn all_digits(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit)
}

/// Digit placeholder mapping for the "looks numeric" prefilter.
fn looks_numeric(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && bytes
            .iter()
            .all(|&b| b.is_ascii_digit() || matches!(b, b'-' | b'.' | b'e' | b'E'))
}

fn integer(text: &[u8]) -> Coerced<'_> {
    // Only ASCII digits and an optional leading '-' reach this point.
    let text = std::str::from_utf8(text).unwrap_or_default();
    match text.parse::<i64>() {
        Ok(n) => Coerced::Int(n),
        Err(_) => Coerced::BigInt(text),
    }
}

pub fn coerce(value: &[u8]) -> Coerced<'_> {
    if all_digits(value) {
        return integer(value);
    }
    if let Some(rest) = value.strip_prefix(b"-") {
        if all_digits(rest) {
            return integer(value);
        }
    }
    if !looks_numeric(value) {
        return Coerced::Bytes(value);
    }

    std::str::from_utf8(value)
        .ok()
        .and_then(|text| text.parse::<f64>().ok())
        .map_or(Coerced::Bytes(value), Coerced::Float)
}

impl Coerced<'_> {
    pub fn into_py_object(self, py: Python<'_>) -> PyResult<PyObject> {
        Ok(match self {
            Self::Int(n) => n.into_py(py),
            // int() refuses text past sys.get_int_max_str_digits()
            Self::BigInt(text) => match py.get_type::<PyLong>().call1((text,)) {
                Ok(n) => n.into_py(py),
                Err(_) => PyBytes::new(py, text.as_bytes()).into_py(py),
            },
            Self::Float(x) => x.into_py(py),
            Self::Bytes(bytes) => PyBytes::new(py, bytes).into_py(py),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_integers() {
        assert_eq!(coerce(b"42"), Coerced::Int(42));
        assert_eq!(coerce(b"-42"), Coerced::Int(-42));
        assert_eq!(coerce(b"007"), Coerced::Int(7));
        assert_eq!(coerce(b"-0"), Coerced::Int(0));
    }

    #[test]
    fn test_floats() {
        assert_eq!(coerce(b"4.2e1"), Coerced::Float(42.0));
        assert_eq!(coerce(b"-1.5"), Coerced::Float(-1.5));
        assert_eq!(coerce(b".5"), Coerced::Float(0.5));
        assert_eq!(coerce(b"1E3"), Coerced::Float(1000.0));
    }

    #[test]
    fn test_strings_stay_bytes() {
        assert_eq!(coerce(b"abc"), Coerced::Bytes(b"abc"));
        assert_eq!(coerce(b""), Coerced::Bytes(b""));
        assert_eq!(coerce(b" 42"), Coerced::Bytes(b" 42"));
        assert_eq!(coerce(b"+42"), Coerced::Bytes(b"+42"));
        assert_eq!(coerce(b"inf"), Coerced::Bytes(b"inf"));
    }

    #[test]
    fn test_numeric_lookalikes_fall_back() {
        // These pass the placeholder prefilter but are not floats.
        for text in [&b"1.2.3"[..], b"-", b"e", b"1e", b"--1", b"1-2", b"."] {
            assert_eq!(coerce(text), Coerced::Bytes(text), "{:?}", text);
        }
    }

    #[test]
    fn test_big_integer_stays_exact() {
        let big = b"123456789012345678901234567890";
        assert_eq!(coerce(big), Coerced::BigInt("123456789012345678901234567890"));

        Python::with_gil(|py| {
            let obj = coerce(big).into_py_object(py).unwrap();
            assert_eq!(obj.as_ref(py).str().unwrap().to_str().unwrap(), "123456789012345678901234567890");
        });
    }

    #[test]
    fn test_oversized_integer_degrades_to_bytes() {
        let digits = "9".repeat(5000);
        Python::with_gil(|py| {
            let obj = coerce(digits.as_bytes()).into_py_object(py).unwrap();
            match obj.extract::<&[u8]>(py) {
                Ok(bytes) => assert_eq!(bytes, digits.as_bytes()),
                // interpreters without a digit limit convert it exactly
                Err(_) => assert!(obj.as_ref(py).is_instance_of::<PyLong>()),
            }
        });
    }

    #[test]
    fn test_into_python_types() {
        Python::with_gil(|py| {
            let int = coerce(b"-7").into_py_object(py).unwrap();
            assert_eq!(int.extract::<i64>(py).unwrap(), -7);

            let float = coerce(b"2.5").into_py_object(py).unwrap();
            assert_eq!(float.extract::<f64>(py).unwrap(), 2.5);

            let bytes = coerce(b"x1").into_py_object(py).unwrap();
            assert_eq!(bytes.extract::<&[u8]>(py).unwrap(), b"x1");
        });
    }

    proptest! {
        #[test]
        fn prop_digit_strings_are_integers(n in 0u64..u64::MAX / 2) {
            let text = n.to_string();
            prop_assert_eq!(coerce(text.as_bytes()), Coerced::Int(n as i64));
        }

        #[test]
        fn prop_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..16)) {
            let _ = coerce(&bytes);
        }

        #[test]
        fn prop_non_numeric_text_is_untouched(text in "[a-df-zA-DF-Z_ ]{1,12}") {
            prop_assert_eq!(coerce(text.as_bytes()), Coerced::Bytes(text.as_bytes()));
        }
    }
}
