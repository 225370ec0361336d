//! Collection builtins and the methods of list/dict/set/tuple values.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use super::{ordered_cmp, require_args};
use crate::diagnostic::Span;
use crate::interpreter::error::RuntimeError;
use crate::value::Value;

fn dummy() -> Span {
    Span::dummy()
}

/// Snapshot the elements of an iterable value, or `None` when the value is
/// not iterable. Dicts iterate over their keys, strings over one-character
/// strings.
pub fn iter_elements(value: &Value) -> Option<Vec<Value>> {
    match value {
        Value::Str(s) => Some(s.chars().map(|c| Value::str(c.to_string())).collect()),
        Value::List(items) => Some(items.borrow().clone()),
        Value::Tuple(items) => Some(items.as_ref().clone()),
        Value::Set(items) => Some(items.borrow().clone()),
        Value::Dict(map) => Some(map.borrow().keys().map(Value::str).collect()),
        _ => None,
    }
}

fn require_iterable(value: &Value) -> Result<Vec<Value>, RuntimeError> {
    iter_elements(value).ok_or_else(|| {
        RuntimeError::type_error(
            format!("'{}' object is not iterable", value.type_name()),
            dummy(),
        )
    })
}

fn require_int(value: &Value, message: &str) -> Result<i64, RuntimeError> {
    match value {
        Value::Number(n, false) => Ok(*n as i64),
        _ => Err(RuntimeError::type_error(message.to_string(), dummy())),
    }
}

pub fn builtin_len(args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "len");
    let len = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(map) => map.borrow().len(),
        Value::Set(items) => items.borrow().len(),
        other => {
            return Err(RuntimeError::type_error(
                format!("object of type '{}' has no len()", other.type_name()),
                dummy(),
            ))
        }
    };
    Ok(Value::int(len as f64))
}

pub fn builtin_range(args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "range");
    let msg = "range() arguments must be integers";
    let (start, stop, step) = match args.len() {
        1 => (0, require_int(&args[0], msg)?, 1),
        2 => (require_int(&args[0], msg)?, require_int(&args[1], msg)?, 1),
        _ => (
            require_int(&args[0], msg)?,
            require_int(&args[1], msg)?,
            require_int(&args[2], msg)?,
        ),
    };
    if step == 0 {
        return Err(RuntimeError::value_error(
            "range() arg 3 must not be zero",
            dummy(),
        ));
    }
    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < stop) || (step < 0 && current > stop) {
        items.push(Value::int(current as f64));
        current += step;
    }
    Ok(Value::list(items))
}

pub fn builtin_sum(args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "sum");
    let items = require_iterable(&args[0])?;
    let mut total = 0.0;
    let mut is_float = false;
    for item in &items {
        match item {
            Value::Number(n, f) => {
                total += n;
                is_float = is_float || *f;
            }
            other => {
                return Err(RuntimeError::type_error(
                    format!(
                        "unsupported operand type(s) for +: 'int' and '{}'",
                        other.type_name()
                    ),
                    dummy(),
                ))
            }
        }
    }
    Ok(Value::Number(total, is_float))
}

fn extremum(args: &[Value], name: &str, want_max: bool) -> Result<Value, RuntimeError> {
    require_args!(args, 1, name);
    let items = if args.len() == 1 {
        require_iterable(&args[0])?
    } else {
        args.to_vec()
    };
    if items.is_empty() {
        return Err(RuntimeError::value_error(
            format!("{}() arg is an empty sequence", name),
            dummy(),
        ));
    }
    let mut best = items[0].clone();
    for item in &items[1..] {
        let beats = match ordered_cmp(item, &best)? {
            Some(std::cmp::Ordering::Greater) => want_max,
            Some(std::cmp::Ordering::Less) => !want_max,
            _ => false,
        };
        if beats {
            best = item.clone();
        }
    }
    Ok(best)
}

pub fn builtin_min(args: &[Value]) -> Result<Value, RuntimeError> {
    extremum(args, "min", false)
}

pub fn builtin_max(args: &[Value]) -> Result<Value, RuntimeError> {
    extremum(args, "max", true)
}

pub fn builtin_sorted(args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(args, 1, "sorted");
    let mut items = require_iterable(&args[0])?;
    sort_values(&mut items)?;
    Ok(Value::list(items))
}

pub(crate) fn sort_values(items: &mut [Value]) -> Result<(), RuntimeError> {
    let mut failure = None;
    items.sort_by(|a, b| match ordered_cmp(a, b) {
        Ok(Some(ordering)) => ordering,
        Ok(None) => std::cmp::Ordering::Equal,
        Err(err) => {
            failure.get_or_insert(err);
            std::cmp::Ordering::Equal
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

pub fn builtin_list(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Ok(Value::list(Vec::new()));
    }
    Ok(Value::list(require_iterable(&args[0])?))
}

pub fn builtin_tuple(args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Ok(Value::tuple(Vec::new()));
    }
    Ok(Value::tuple(require_iterable(&args[0])?))
}

pub fn builtin_set(args: &[Value]) -> Result<Value, RuntimeError> {
    let mut out: Vec<Value> = Vec::new();
    if !args.is_empty() {
        for item in require_iterable(&args[0])? {
            if !out.contains(&item) {
                out.push(item);
            }
        }
    }
    Ok(Value::Set(Rc::new(RefCell::new(out))))
}

pub fn builtin_dict(args: &[Value]) -> Result<Value, RuntimeError> {
    match args.first() {
        None => Ok(Value::Dict(Rc::new(RefCell::new(IndexMap::new())))),
        Some(Value::Dict(map)) => Ok(Value::Dict(Rc::new(RefCell::new(map.borrow().clone())))),
        Some(other) => Err(RuntimeError::type_error(
            format!("cannot build a dict from '{}'", other.type_name()),
            dummy(),
        )),
    }
}

pub fn has_list_method(name: &str) -> bool {
    matches!(
        name,
        "append"
            | "pop"
            | "insert"
            | "remove"
            | "index"
            | "count"
            | "extend"
            | "reverse"
            | "sort"
            | "clear"
    )
}

pub fn list_method(
    list: &Rc<RefCell<Vec<Value>>>,
    name: &str,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    match name {
        "append" => {
            require_args!(args, 1, "append");
            list.borrow_mut().push(args[0].clone());
            Ok(Value::None)
        }
        "pop" => {
            let mut items = list.borrow_mut();
            if items.is_empty() {
                return Err(RuntimeError::index_error("pop from empty list", dummy()));
            }
            let index = match args.first() {
                Some(value) => {
                    let i = require_int(value, "list indices must be integers")?;
                    let len = items.len() as i64;
                    let i = if i < 0 { i + len } else { i };
                    if i < 0 || i >= len {
                        return Err(RuntimeError::index_error(
                            "pop index out of range",
                            dummy(),
                        ));
                    }
                    i as usize
                }
                None => items.len() - 1,
            };
            Ok(items.remove(index))
        }
        "insert" => {
            require_args!(args, 2, "insert");
            let mut items = list.borrow_mut();
            let len = items.len() as i64;
            let i = require_int(&args[0], "list indices must be integers")?;
            let i = if i < 0 { (i + len).max(0) } else { i.min(len) };
            items.insert(i as usize, args[1].clone());
            Ok(Value::None)
        }
        "remove" => {
            require_args!(args, 1, "remove");
            let mut items = list.borrow_mut();
            match items.iter().position(|item| *item == args[0]) {
                Some(index) => {
                    items.remove(index);
                    Ok(Value::None)
                }
                None => Err(RuntimeError::value_error(
                    "list.remove(x): x not in list",
                    dummy(),
                )),
            }
        }
        "index" => {
            require_args!(args, 1, "index");
            let items = list.borrow();
            match items.iter().position(|item| *item == args[0]) {
                Some(index) => Ok(Value::int(index as f64)),
                None => Err(RuntimeError::value_error(
                    format!("{} is not in list", args[0].repr_str()),
                    dummy(),
                )),
            }
        }
        "count" => {
            require_args!(args, 1, "count");
            let count = list.borrow().iter().filter(|item| **item == args[0]).count();
            Ok(Value::int(count as f64))
        }
        "extend" => {
            require_args!(args, 1, "extend");
            let extra = require_iterable(&args[0])?;
            list.borrow_mut().extend(extra);
            Ok(Value::None)
        }
        "reverse" => {
            list.borrow_mut().reverse();
            Ok(Value::None)
        }
        "sort" => {
            let mut items = list.borrow_mut();
            sort_values(&mut items)?;
            Ok(Value::None)
        }
        "clear" => {
            list.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Err(RuntimeError::attribute_error("list", name, dummy())),
    }
}

pub fn has_dict_method(name: &str) -> bool {
    matches!(
        name,
        "get" | "keys" | "values" | "items" | "pop" | "update" | "clear"
    )
}

fn require_key(value: &Value) -> Result<String, RuntimeError> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(RuntimeError::type_error(
            format!("dict keys must be strings, not '{}'", other.type_name()),
            dummy(),
        )),
    }
}

pub fn dict_method(
    map: &Rc<RefCell<IndexMap<String, Value>>>,
    name: &str,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    match name {
        "get" => {
            require_args!(args, 1, "get");
            let key = require_key(&args[0])?;
            match map.borrow().get(&key) {
                Some(value) => Ok(value.clone()),
                None => Ok(args.get(1).cloned().unwrap_or(Value::None)),
            }
        }
        "keys" => Ok(Value::list(
            map.borrow().keys().map(Value::str).collect(),
        )),
        "values" => Ok(Value::list(map.borrow().values().cloned().collect())),
        "items" => Ok(Value::list(
            map.borrow()
                .iter()
                .map(|(k, v)| Value::tuple(vec![Value::str(k), v.clone()]))
                .collect(),
        )),
        "pop" => {
            require_args!(args, 1, "pop");
            let key = require_key(&args[0])?;
            match map.borrow_mut().shift_remove(&key) {
                Some(value) => Ok(value),
                None => match args.get(1) {
                    Some(default) => Ok(default.clone()),
                    None => Err(RuntimeError::key_error(&key, dummy())),
                },
            }
        }
        "update" => {
            require_args!(args, 1, "update");
            match &args[0] {
                Value::Dict(other) => {
                    let other = other.borrow().clone();
                    map.borrow_mut().extend(other);
                    Ok(Value::None)
                }
                other => Err(RuntimeError::type_error(
                    format!("update() expects a dict, not '{}'", other.type_name()),
                    dummy(),
                )),
            }
        }
        "clear" => {
            map.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Err(RuntimeError::attribute_error("dict", name, dummy())),
    }
}

pub fn has_set_method(name: &str) -> bool {
    matches!(name, "add" | "remove" | "discard" | "clear")
}

pub fn set_method(
    set: &Rc<RefCell<Vec<Value>>>,
    name: &str,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    match name {
        "add" => {
            require_args!(args, 1, "add");
            let mut items = set.borrow_mut();
            if !items.contains(&args[0]) {
                items.push(args[0].clone());
            }
            Ok(Value::None)
        }
        "remove" => {
            require_args!(args, 1, "remove");
            let mut items = set.borrow_mut();
            match items.iter().position(|item| *item == args[0]) {
                Some(index) => {
                    items.remove(index);
                    Ok(Value::None)
                }
                None => Err(RuntimeError::key_error(&args[0].repr_str(), dummy())),
            }
        }
        "discard" => {
            require_args!(args, 1, "discard");
            let mut items = set.borrow_mut();
            if let Some(index) = items.iter().position(|item| *item == args[0]) {
                items.remove(index);
            }
            Ok(Value::None)
        }
        "clear" => {
            set.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Err(RuntimeError::attribute_error("set", name, dummy())),
    }
}

pub fn has_tuple_method(name: &str) -> bool {
    matches!(name, "index" | "count")
}

pub fn tuple_method(
    items: &Rc<Vec<Value>>,
    name: &str,
    args: &[Value],
) -> Result<Value, RuntimeError> {
    match name {
        "index" => {
            require_args!(args, 1, "index");
            match items.iter().position(|item| *item == args[0]) {
                Some(index) => Ok(Value::int(index as f64)),
                None => Err(RuntimeError::value_error(
                    "tuple.index(x): x not in tuple",
                    dummy(),
                )),
            }
        }
        "count" => {
            require_args!(args, 1, "count");
            let count = items.iter().filter(|item| **item == args[0]).count();
            Ok(Value::int(count as f64))
        }
        _ => Err(RuntimeError::attribute_error("tuple", name, dummy())),
    }
}
