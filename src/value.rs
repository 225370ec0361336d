use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::Expr;
use crate::ast::Stmt;
use crate::interpreter::environment::Environment;

/// Runtime values of the host language.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Number(f64, bool), // (value, is_float)
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Tuple(Rc<Vec<Value>>),
    Dict(Rc<RefCell<IndexMap<String, Value>>>),
    Set(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    Builtin(Rc<str>),
    BoundMethod(Rc<BoundMethod>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    Module(Rc<Module>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a, _), Value::Number(b, _)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// A `def` body.
    Block(Vec<Stmt>),
    /// A `lambda` body.
    Expr(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Rc<str>,
    pub params: Vec<Rc<str>>,
    pub body: FunctionBody,
    /// Defining scope, for closures.
    pub env: Environment,
}

#[derive(Debug, Clone)]
pub enum MethodImpl {
    User(Rc<Function>),
    /// A method on a builtin type, dispatched by name at call time.
    Native(Rc<str>),
}

#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub receiver: Value,
    pub method: MethodImpl,
}

#[derive(Debug)]
pub struct Class {
    pub name: Rc<str>,
    /// Class-body bindings: methods and class attributes alike.
    pub attrs: IndexMap<String, Value>,
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<IndexMap<String, Value>>,
}

#[derive(Debug)]
pub struct Module {
    pub name: Rc<str>,
    pub attrs: IndexMap<String, Value>,
}

impl Value {
    pub fn int(n: f64) -> Self {
        Value::Number(n, false)
    }

    pub fn float(n: f64) -> Self {
        Value::Number(n, true)
    }

    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(Rc::new(items))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Number(n, _) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(map) => !map.borrow().is_empty(),
            Value::Set(items) => !items.borrow().is_empty(),
            _ => true,
        }
    }

    /// The host type name, as reported by `type()` and in fault messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Number(_, true) => "float".to_string(),
            Value::Number(_, false) => "int".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Tuple(_) => "tuple".to_string(),
            Value::Dict(_) => "dict".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Builtin(_) => "builtin_function_or_method".to_string(),
            Value::BoundMethod(_) => "method".to_string(),
            Value::Class(class) => format!("type[{}]", class.name),
            Value::Instance(instance) => instance.class.name.to_string(),
            Value::Module(_) => "module".to_string(),
        }
    }

    /// `str()` conversion: what `print` writes.
    pub fn display_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.repr_str(),
        }
    }

    /// `repr()` conversion: what the interactive echo and containers show.
    pub fn repr_str(&self) -> String {
        match self {
            Value::None => "None".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Number(n, is_float) => format_number(*n, *is_float),
            Value::Str(s) => {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('\'', "\\'")
                    .replace('\n', "\\n")
                    .replace('\r', "\\r")
                    .replace('\t', "\\t");
                format!("'{}'", escaped)
            }
            Value::List(items) => {
                let parts: Vec<String> =
                    items.borrow().iter().map(|v| v.repr_str()).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Tuple(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.repr_str()).collect();
                if parts.len() == 1 {
                    format!("({},)", parts[0])
                } else {
                    format!("({})", parts.join(", "))
                }
            }
            Value::Dict(map) => {
                let parts: Vec<String> = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", Value::str(k).repr_str(), v.repr_str()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Set(items) => {
                let items = items.borrow();
                if items.is_empty() {
                    "set()".to_string()
                } else {
                    let parts: Vec<String> = items.iter().map(|v| v.repr_str()).collect();
                    format!("{{{}}}", parts.join(", "))
                }
            }
            Value::Function(func) => format!("<function {}>", func.name),
            Value::Builtin(name) => format!("<built-in function {}>", name),
            Value::BoundMethod(bound) => {
                let name = match &bound.method {
                    MethodImpl::User(func) => func.name.to_string(),
                    MethodImpl::Native(name) => name.to_string(),
                };
                format!("<bound method {}>", name)
            }
            Value::Class(class) => format!("<class '{}'>", class.name),
            Value::Instance(instance) => format!("<{} object>", instance.class.name),
            Value::Module(module) => format!("<module '{}'>", module.name),
        }
    }
}

/// Number formatting keeps the int/float distinction visible: ints print
/// without a fractional part, whole floats keep a `.0`.
pub fn format_number(n: f64, is_float: bool) -> String {
    if !is_float {
        return format!("{:.0}", n);
    }
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e16 {
        format!("{:.1}", n)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::int(0.0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(!Value::list(vec![]).is_truthy());
        assert!(Value::int(2.0).is_truthy());
        assert!(Value::str("x").is_truthy());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(Value::int(2.0).display_str(), "2");
        assert_eq!(Value::float(2.0).display_str(), "2.0");
        assert_eq!(Value::float(0.5).display_str(), "0.5");
        assert_eq!(Value::float(f64::INFINITY).display_str(), "inf");
        assert_eq!(Value::float(f64::NEG_INFINITY).display_str(), "-inf");
    }

    #[test]
    fn test_repr_distinguishes_strings() {
        assert_eq!(Value::str("oi").display_str(), "oi");
        assert_eq!(Value::str("oi").repr_str(), "'oi'");
        assert_eq!(
            Value::list(vec![Value::int(1.0), Value::str("a")]).repr_str(),
            "[1, 'a']"
        );
    }

    #[test]
    fn test_tuple_repr() {
        assert_eq!(Value::tuple(vec![Value::int(1.0)]).repr_str(), "(1,)");
        assert_eq!(
            Value::tuple(vec![Value::int(1.0), Value::int(2.0)]).repr_str(),
            "(1, 2)"
        );
    }

    #[test]
    fn test_equality_is_structural_for_data() {
        assert_eq!(Value::int(2.0), Value::float(2.0));
        assert_eq!(
            Value::list(vec![Value::int(1.0)]),
            Value::list(vec![Value::int(1.0)])
        );
        assert_ne!(Value::Bool(true), Value::int(1.0));
    }
}
