//! The `math` module value seeded into every session namespace.

use indexmap::IndexMap;
use std::rc::Rc;

use super::require_args;
use crate::diagnostic::Span;
use crate::interpreter::error::RuntimeError;
use crate::value::{Module, Value};

const FUNCTIONS: &[&str] = &[
    "sqrt", "floor", "ceil", "sin", "cos", "tan", "log", "exp", "pow", "fabs",
];

/// Build the module value. Functions are builtin references qualified with
/// the module name; constants are plain numbers.
pub fn module() -> Value {
    let mut attrs = IndexMap::new();
    for name in FUNCTIONS {
        attrs.insert(
            name.to_string(),
            Value::Builtin(Rc::from(format!("math.{}", name).as_str())),
        );
    }
    attrs.insert("pi".to_string(), Value::float(std::f64::consts::PI));
    attrs.insert("e".to_string(), Value::float(std::f64::consts::E));
    attrs.insert("tau".to_string(), Value::float(std::f64::consts::TAU));
    attrs.insert("inf".to_string(), Value::float(f64::INFINITY));
    attrs.insert("nan".to_string(), Value::float(f64::NAN));
    Value::Module(Rc::new(Module {
        name: Rc::from("math"),
        attrs,
    }))
}

/// Whether a qualified builtin name (`math.sqrt`) belongs to this module.
pub fn is_math_builtin(name: &str) -> bool {
    name.strip_prefix("math.")
        .map(|rest| FUNCTIONS.contains(&rest))
        .unwrap_or(false)
}

fn require_number(value: &Value, who: &str) -> Result<f64, RuntimeError> {
    match value {
        Value::Number(n, _) => Ok(*n),
        other => Err(RuntimeError::type_error(
            format!("{} expects a number, not '{}'", who, other.type_name()),
            Span::dummy(),
        )),
    }
}

/// Dispatch a qualified `math.*` call.
pub fn math_call(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let func = name.strip_prefix("math.").unwrap_or(name);
    require_args!(args, 1, func);
    let n = require_number(&args[0], func)?;
    let result = match func {
        "sqrt" => {
            if n < 0.0 {
                return Err(RuntimeError::value_error("math domain error", Span::dummy()));
            }
            n.sqrt()
        }
        "floor" => return Ok(Value::int(n.floor())),
        "ceil" => return Ok(Value::int(n.ceil())),
        "sin" => n.sin(),
        "cos" => n.cos(),
        "tan" => n.tan(),
        "log" => {
            if n <= 0.0 {
                return Err(RuntimeError::value_error("math domain error", Span::dummy()));
            }
            match args.get(1) {
                Some(base) => n.log(require_number(base, "log")?),
                None => n.ln(),
            }
        }
        "exp" => n.exp(),
        "pow" => {
            require_args!(args, 2, "pow");
            n.powf(require_number(&args[1], "pow")?)
        }
        "fabs" => n.abs(),
        _ => {
            return Err(RuntimeError::attribute_error("module", func, Span::dummy()));
        }
    };
    Ok(Value::float(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_exposes_constants() {
        match module() {
            Value::Module(module) => {
                assert_eq!(
                    module.attrs.get("pi"),
                    Some(&Value::float(std::f64::consts::PI))
                );
                assert!(module.attrs.contains_key("sqrt"));
            }
            other => panic!("expected module, got {:?}", other),
        }
    }

    #[test]
    fn test_math_calls() {
        assert_eq!(
            math_call("math.sqrt", &[Value::int(9.0)]).unwrap(),
            Value::float(3.0)
        );
        assert_eq!(
            math_call("math.floor", &[Value::float(2.7)]).unwrap(),
            Value::int(2.0)
        );
        assert!(math_call("math.sqrt", &[Value::int(-1.0)]).is_err());
        assert!(math_call("math.log", &[Value::int(0.0)]).is_err());
    }

    #[test]
    fn test_qualified_name_check() {
        assert!(is_math_builtin("math.sqrt"));
        assert!(!is_math_builtin("sqrt"));
        assert!(!is_math_builtin("math.unknown"));
    }
}
