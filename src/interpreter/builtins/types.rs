//! Type conversion and introspection builtins.

use super::require_args;
use crate::diagnostic::Span;
use crate::interpreter::error::RuntimeError;
use crate::value::Value;

fn dummy() -> Span {
    Span::dummy()
}

pub fn builtin_abs(args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "abs");
    match &args[0] {
        Value::Number(n, is_float) => Ok(Value::Number(n.abs(), *is_float)),
        other => Err(RuntimeError::type_error(
            format!("bad operand type for abs(): '{}'", other.type_name()),
            dummy(),
        )),
    }
}

pub fn builtin_round(args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "round");
    let n = match &args[0] {
        Value::Number(n, _) => *n,
        other => {
            return Err(RuntimeError::type_error(
                format!("type {} doesn't define a rounding", other.type_name()),
                dummy(),
            ))
        }
    };
    match args.get(1) {
        None => Ok(Value::int(n.round())),
        Some(Value::Number(digits, false)) => {
            let factor = 10f64.powi(*digits as i32);
            Ok(Value::float((n * factor).round() / factor))
        }
        Some(other) => Err(RuntimeError::type_error(
            format!(
                "round() second argument must be an integer, not '{}'",
                other.type_name()
            ),
            dummy(),
        )),
    }
}

pub fn builtin_int(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Ok(Value::int(0.0));
    }
    match &args[0] {
        Value::Number(n, _) => Ok(Value::int(n.trunc())),
        Value::Bool(b) => Ok(Value::int(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(|n| Value::int(n as f64))
            .map_err(|_| {
                RuntimeError::value_error(
                    format!("invalid literal for int(): {}", Value::str(s).repr_str()),
                    dummy(),
                )
            }),
        other => Err(RuntimeError::type_error(
            format!("int() argument must be a number or string, not '{}'", other.type_name()),
            dummy(),
        )),
    }
}

pub fn builtin_float(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Ok(Value::float(0.0));
    }
    match &args[0] {
        Value::Number(n, _) => Ok(Value::float(*n)),
        Value::Bool(b) => Ok(Value::float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => match s.trim() {
            "inf" => Ok(Value::float(f64::INFINITY)),
            "-inf" => Ok(Value::float(f64::NEG_INFINITY)),
            "nan" => Ok(Value::float(f64::NAN)),
            trimmed => trimmed.parse::<f64>().map(Value::float).map_err(|_| {
                RuntimeError::value_error(
                    format!("could not convert string to float: {}", Value::str(s).repr_str()),
                    dummy(),
                )
            }),
        },
        other => Err(RuntimeError::type_error(
            format!(
                "float() argument must be a number or string, not '{}'",
                other.type_name()
            ),
            dummy(),
        )),
    }
}

pub fn builtin_bool(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(
        args.first().map(Value::is_truthy).unwrap_or(false),
    ))
}

pub fn builtin_str(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(match args.first() {
        Some(value) => Value::str(value.display_str()),
        None => Value::str(""),
    })
}

pub fn builtin_type(args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "type");
    Ok(Value::str(args[0].type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_preserves_intness() {
        assert_eq!(builtin_abs(&[Value::int(-3.0)]).unwrap(), Value::Number(3.0, false));
        assert_eq!(
            builtin_abs(&[Value::float(-3.5)]).unwrap(),
            Value::Number(3.5, true)
        );
        assert!(builtin_abs(&[Value::str("x")]).is_err());
    }

    #[test]
    fn test_int_conversions() {
        assert_eq!(builtin_int(&[Value::float(3.9)]).unwrap(), Value::int(3.0));
        assert_eq!(builtin_int(&[Value::str(" 42 ")]).unwrap(), Value::int(42.0));
        assert_eq!(builtin_int(&[Value::Bool(true)]).unwrap(), Value::int(1.0));
        assert!(builtin_int(&[Value::str("3.5")]).is_err());
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(builtin_float(&[Value::int(2.0)]).unwrap(), Value::float(2.0));
        assert_eq!(
            builtin_float(&[Value::str("0.5")]).unwrap(),
            Value::float(0.5)
        );
        assert!(builtin_float(&[Value::str("abc")]).is_err());
    }

    #[test]
    fn test_round() {
        assert_eq!(builtin_round(&[Value::float(2.6)]).unwrap(), Value::int(3.0));
        assert_eq!(
            builtin_round(&[Value::float(2.346), Value::int(2.0)]).unwrap(),
            Value::float(2.35)
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(builtin_type(&[Value::int(1.0)]).unwrap(), Value::str("int"));
        assert_eq!(
            builtin_type(&[Value::float(1.0)]).unwrap(),
            Value::str("float")
        );
        assert_eq!(builtin_type(&[Value::None]).unwrap(), Value::str("NoneType"));
    }

    #[test]
    fn test_str_builtin() {
        assert_eq!(builtin_str(&[Value::int(2.0)]).unwrap(), Value::str("2"));
        assert_eq!(builtin_str(&[]).unwrap(), Value::str(""));
    }
}
