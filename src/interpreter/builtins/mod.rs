//! Built-in functions of the host language.
//!
//! Functions are organized into categories:
//! - **Collections**: len, range, sum, min, max, sorted, constructors, and
//!   the methods of list/dict/set/tuple values
//! - **Strings**: string methods
//! - **Types**: conversions and introspection (int, float, bool, str, type,
//!   abs, round)
//! - **IO**: print and input, writing through the call-scoped capture sink
//! - **Math**: the `math` module value and its functions
//!
//! Unqualified name resolution falls back to this registry after the
//! session namespace misses, so the host names work alongside the localized
//! aliases seeded into the namespace.

pub mod collections;
pub mod io;
pub mod mathmod;
pub mod strings;
pub mod types;

pub use collections::*;
pub use io::*;
pub use strings::*;
pub use types::*;

use std::cmp::Ordering;

use crate::interpreter::error::RuntimeError;
use crate::value::Value;

/// Names resolvable as bare builtins.
pub const BUILTIN_NAMES: &[&str] = &[
    "print", "input", "len", "range", "abs", "min", "max", "sum", "sorted", "list", "tuple",
    "dict", "set", "str", "int", "float", "bool", "round", "type", "help", "exit",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

macro_rules! require_args {
    ($args:expr, $n:expr, $name:expr) => {
        if $args.len() < $n {
            return Err(RuntimeError::type_error(
                format!("{}() takes at least {} argument(s)", $name, $n),
                crate::diagnostic::Span::dummy(),
            ));
        }
    };
}

pub(crate) use require_args;

/// Ordering between two values, for `<`-family comparisons and sorting.
/// `Ok(None)` means the values are unordered (NaN involved); mixed types
/// are a fault.
pub fn ordered_cmp(a: &Value, b: &Value) -> Result<Option<Ordering>, RuntimeError> {
    match (a, b) {
        (Value::Number(x, _), Value::Number(y, _)) => Ok(x.partial_cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(Some(x.cmp(y))),
        (Value::List(x), Value::List(y)) => {
            let x = x.borrow();
            let y = y.borrow();
            cmp_sequences(&x, &y)
        }
        (Value::Tuple(x), Value::Tuple(y)) => cmp_sequences(x, y),
        _ => Err(RuntimeError::type_error(
            format!(
                "'<' not supported between instances of '{}' and '{}'",
                a.type_name(),
                b.type_name()
            ),
            crate::diagnostic::Span::dummy(),
        )),
    }
}

fn cmp_sequences(a: &[Value], b: &[Value]) -> Result<Option<Ordering>, RuntimeError> {
    for (x, y) in a.iter().zip(b.iter()) {
        match ordered_cmp(x, y)? {
            Some(Ordering::Equal) => continue,
            other => return Ok(other),
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_contains_core_names() {
        assert!(is_builtin("print"));
        assert!(is_builtin("len"));
        assert!(is_builtin("exit"));
        assert!(!is_builtin("mostre"));
    }

    #[test]
    fn test_ordered_cmp_numbers_and_strings() {
        assert_eq!(
            ordered_cmp(&Value::int(1.0), &Value::int(2.0)).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            ordered_cmp(&Value::str("a"), &Value::str("b")).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            ordered_cmp(&Value::float(f64::NAN), &Value::int(1.0)).unwrap(),
            None
        );
        assert!(ordered_cmp(&Value::int(1.0), &Value::str("a")).is_err());
    }

    #[test]
    fn test_ordered_cmp_sequences() {
        let a = Value::tuple(vec![Value::int(1.0), Value::int(2.0)]);
        let b = Value::tuple(vec![Value::int(1.0), Value::int(3.0)]);
        assert_eq!(ordered_cmp(&a, &b).unwrap(), Some(Ordering::Less));
    }
}
