//! Resolution of dotted call targets such as `f` or `os.path.join`

use super::namespace::Namespace;
use crate::errors::BridgeError;
use pyo3::exceptions::PyAttributeError;
use pyo3::prelude::*;

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

fn type_name(value: &PyAny) -> String {
    value
        .get_type()
        .name()
        .map(str::to_owned)
        .unwrap_or_else(|_| "object".to_string())
}

/// Walk `path` from the namespace (then builtins) through attributes and
/// return the target if it is callable.
pub fn resolve_callable<'py>(py: Python<'py>, namespace: &Namespace, path: &str) -> Result<&'py PyAny, BridgeError> {
    let mut segments = path.split('.');
    if let Some(bad) = path.split('.').find(|s| !is_identifier(s)) {
        return Err(BridgeError::not_found(
            path,
            format!("NameError: '{}' is not a valid name in '{}'", bad, path),
        ));
    }

    // split() always yields at least one segment
    let head = segments.next().unwrap_or_default();
    let mut target = match namespace.get(py, head)? {
        Some(value) => value,
        None => namespace.builtins(py).getattr(head).map_err(|_| {
            BridgeError::not_found(path, format!("NameError: name '{}' is not defined", head))
        })?,
    };

    for segment in segments {
        target = target.getattr(segment).map_err(|err| {
            if err.is_instance_of::<PyAttributeError>(py) {
                BridgeError::from_py(py, err).into_not_found(path)
            } else {
                BridgeError::from_py(py, err)
            }
        })?;
    }

    if !target.is_callable() {
        return Err(BridgeError::not_callable(path, &type_name(target)));
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::infrastructure::PythonConfig;
    use pyo3::types::PyBytes;

    fn setup(py: Python<'_>) -> Namespace {
        let ns = Namespace::new(py, &PythonConfig::default()).unwrap();
        ns.exec(
            py,
            PyBytes::new(py, b"import os.path\nclass Box:\n    limit = 3\n    def twice(v):\n        return v * 2\ncount = 5\n"),
        )
        .unwrap();
        ns
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("f"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("f(1)"));
    }

    #[test]
    fn test_resolves_names_attributes_and_builtins() {
        Python::with_gil(|py| {
            let ns = setup(py);
            assert!(resolve_callable(py, &ns, "Box.twice").is_ok());
            assert!(resolve_callable(py, &ns, "os.path.join").is_ok());
            assert!(resolve_callable(py, &ns, "len").is_ok());
        });
    }

    #[test]
    fn test_missing_names() {
        Python::with_gil(|py| {
            let ns = setup(py);
            let err = resolve_callable(py, &ns, "nosuch").unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound { path: "nosuch".into() });
            assert_eq!(err.message, "NameError: name 'nosuch' is not defined");

            let err = resolve_callable(py, &ns, "Box.nope").unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotFound { path: "Box.nope".into() });
            assert!(err.message.starts_with("AttributeError"), "{}", err.message);

            let err = resolve_callable(py, &ns, "Box..twice").unwrap_err();
            assert!(matches!(err.kind, ErrorKind::NotFound { .. }));
        });
    }

    #[test]
    fn test_not_callable() {
        Python::with_gil(|py| {
            let ns = setup(py);
            let err = resolve_callable(py, &ns, "count").unwrap_err();
            assert_eq!(err.kind, ErrorKind::NotCallable { path: "count".into() });
            assert_eq!(err.message, "TypeError: 'int' object is not callable");

            let err = resolve_callable(py, &ns, "Box.limit").unwrap_err();
            assert!(matches!(err.kind, ErrorKind::NotCallable { .. }));
        });
    }
}
