//! String methods.

use std::rc::Rc;

use super::require_args;
use crate::diagnostic::Span;
use crate::interpreter::error::RuntimeError;
use crate::value::Value;

fn dummy() -> Span {
    Span::dummy()
}

fn require_str(value: &Value, who: &str) -> Result<Rc<str>, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Err(RuntimeError::type_error(
            format!("{} expects a string, not '{}'", who, other.type_name()),
            dummy(),
        )),
    }
}

pub fn has_str_method(name: &str) -> bool {
    matches!(
        name,
        "upper"
            | "lower"
            | "strip"
            | "split"
            | "join"
            | "replace"
            | "startswith"
            | "endswith"
            | "find"
            | "count"
    )
}

pub fn str_method(receiver: &str, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    match name {
        "upper" => Ok(Value::str(receiver.to_uppercase())),
        "lower" => Ok(Value::str(receiver.to_lowercase())),
        "strip" => Ok(Value::str(receiver.trim())),
        "split" => {
            let parts: Vec<Value> = match args.first() {
                Some(sep) => {
                    let sep = require_str(sep, "split()")?;
                    if sep.is_empty() {
                        return Err(RuntimeError::value_error("empty separator", dummy()));
                    }
                    receiver.split(sep.as_ref()).map(Value::str).collect()
                }
                None => receiver.split_whitespace().map(Value::str).collect(),
            };
            Ok(Value::list(parts))
        }
        "join" => {
            require_args!(args, 1, "join");
            let items = match &args[0] {
                Value::List(items) => items.borrow().clone(),
                Value::Tuple(items) => items.as_ref().clone(),
                other => {
                    return Err(RuntimeError::type_error(
                        format!("can only join an iterable, not '{}'", other.type_name()),
                        dummy(),
                    ))
                }
            };
            let mut parts = Vec::with_capacity(items.len());
            for item in &items {
                parts.push(require_str(item, "join()")?.to_string());
            }
            Ok(Value::str(parts.join(receiver)))
        }
        "replace" => {
            require_args!(args, 2, "replace");
            let from = require_str(&args[0], "replace()")?;
            let to = require_str(&args[1], "replace()")?;
            Ok(Value::str(receiver.replace(from.as_ref(), to.as_ref())))
        }
        "startswith" => {
            require_args!(args, 1, "startswith");
            let prefix = require_str(&args[0], "startswith()")?;
            Ok(Value::Bool(receiver.starts_with(prefix.as_ref())))
        }
        "endswith" => {
            require_args!(args, 1, "endswith");
            let suffix = require_str(&args[0], "endswith()")?;
            Ok(Value::Bool(receiver.ends_with(suffix.as_ref())))
        }
        "find" => {
            require_args!(args, 1, "find");
            let needle = require_str(&args[0], "find()")?;
            match receiver.find(needle.as_ref()) {
                Some(byte_index) => {
                    let char_index = receiver[..byte_index].chars().count();
                    Ok(Value::int(char_index as f64))
                }
                None => Ok(Value::int(-1.0)),
            }
        }
        "count" => {
            require_args!(args, 1, "count");
            let needle = require_str(&args[0], "count()")?;
            if needle.is_empty() {
                return Ok(Value::int((receiver.chars().count() + 1) as f64));
            }
            Ok(Value::int(receiver.matches(needle.as_ref()).count() as f64))
        }
        _ => Err(RuntimeError::attribute_error("str", name, dummy())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_methods() {
        assert_eq!(str_method("Oi", "upper", &[]).unwrap(), Value::str("OI"));
        assert_eq!(str_method("Oi", "lower", &[]).unwrap(), Value::str("oi"));
    }

    #[test]
    fn test_split_default_and_separator() {
        assert_eq!(
            str_method("a b  c", "split", &[]).unwrap(),
            Value::list(vec![Value::str("a"), Value::str("b"), Value::str("c")])
        );
        assert_eq!(
            str_method("a,b", "split", &[Value::str(",")]).unwrap(),
            Value::list(vec![Value::str("a"), Value::str("b")])
        );
    }

    #[test]
    fn test_join() {
        let items = Value::list(vec![Value::str("a"), Value::str("b")]);
        assert_eq!(
            str_method("-", "join", &[items]).unwrap(),
            Value::str("a-b")
        );
        let bad = Value::list(vec![Value::int(1.0)]);
        assert!(str_method("-", "join", &[bad]).is_err());
    }

    #[test]
    fn test_find_returns_char_index() {
        assert_eq!(
            str_method("héllo", "find", &[Value::str("llo")]).unwrap(),
            Value::int(2.0)
        );
        assert_eq!(
            str_method("abc", "find", &[Value::str("z")]).unwrap(),
            Value::int(-1.0)
        );
    }

    #[test]
    fn test_unknown_method() {
        assert!(str_method("x", "explode", &[]).is_err());
    }
}
