use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{BinaryOp, BoolOp, CmpOp, Expr, ExprKind, Stmt, UnaryOp};
use crate::diagnostic::Span;
use crate::extensions;
use crate::value::{BoundMethod, Class, Function, FunctionBody, Instance, MethodImpl, Value};

use super::builtins;
use super::builtins::mathmod;
use super::control_flow::ControlFlow;
use super::environment::Environment;
use super::error::{ErrorKind, ExitRequest, Fault, RuntimeError};

/// Bound on user-code call depth. Exceeding it raises an ordinary
/// RecursionError fault instead of overflowing the interpreter's own stack.
pub const RECURSION_LIMIT: usize = 500;

#[derive(Default)]
struct Frame {
    globals: HashSet<String>,
    nonlocals: HashSet<String>,
}

/// Tree-walking evaluator. Runs statements against a scope chain rooted at
/// the session namespace; `print` output and interactive echo accumulate in
/// the call-scoped stdout sink.
pub struct Interpreter {
    env: Environment,
    globals: Environment,
    frames: Vec<Frame>,
    stdout: String,
    echo: bool,
    depth: usize,
    active_faults: Vec<RuntimeError>,
}

impl Interpreter {
    pub fn new(namespace: Environment) -> Self {
        Self {
            env: namespace.clone(),
            globals: namespace,
            frames: Vec::new(),
            stdout: String::new(),
            echo: false,
            depth: 0,
            active_faults: Vec::new(),
        }
    }

    /// An interpreter that additionally echoes the value of non-None
    /// expression statements executed directly in the unit, the way the
    /// interactive session presents results.
    pub fn with_echo(namespace: Environment) -> Self {
        let mut interp = Self::new(namespace);
        interp.echo = true;
        interp
    }

    pub fn take_stdout(&mut self) -> String {
        std::mem::take(&mut self.stdout)
    }

    pub fn run(&mut self, stmts: &[Stmt]) -> Result<(), Fault> {
        self.exec_block(stmts)?;
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<ControlFlow, Fault> {
        for stmt in stmts {
            match self.exec_stmt(stmt)? {
                ControlFlow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(ControlFlow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<ControlFlow, Fault> {
        match stmt {
            Stmt::Expr(expr) => {
                let value = self.evaluate(expr)?;
                if self.echo && self.depth == 0 && value != Value::None {
                    self.stdout.push_str(&value.repr_str());
                    self.stdout.push('\n');
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Assign { target, value } => {
                let value = self.evaluate(value)?;
                self.assign_to_target(target, value)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::AugAssign { target, op, value } => {
                self.exec_aug_assign(target, *op, value)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::If {
                branches,
                else_body,
            } => {
                for (condition, body) in branches {
                    if self.evaluate(condition)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                if let Some(body) = else_body {
                    return self.exec_block(body);
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.exec_block(body)? {
                        ControlFlow::Break => break,
                        ControlFlow::Continue | ControlFlow::Normal => {}
                        flow @ ControlFlow::Return(_) => return Ok(flow),
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::For {
                target,
                iterable,
                body,
            } => {
                let value = self.evaluate(iterable)?;
                let elements = builtins::iter_elements(&value).ok_or_else(|| {
                    RuntimeError::type_error(
                        format!("'{}' object is not iterable", value.type_name()),
                        iterable.span,
                    )
                })?;
                for element in elements {
                    self.assign_name(target, element)?;
                    match self.exec_block(body)? {
                        ControlFlow::Break => break,
                        ControlFlow::Continue | ControlFlow::Normal => {}
                        flow @ ControlFlow::Return(_) => return Ok(flow),
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Def { name, params, body } => {
                let func = Function {
                    name: name.clone(),
                    params: params.clone(),
                    body: FunctionBody::Block(body.clone()),
                    env: self.env.clone(),
                };
                self.assign_name(name, Value::Function(Rc::new(func)))?;
                Ok(ControlFlow::Normal)
            }
            Stmt::ClassDef { name, body, span } => {
                let class_env = Environment::with_parent(Rc::new(self.env.clone()));
                let saved = std::mem::replace(&mut self.env, class_env.clone());
                let result = self.exec_block(body);
                self.env = saved;
                result?;
                let mut attrs = IndexMap::new();
                for (attr_name, attr_value) in class_env.local_bindings() {
                    attrs.insert(attr_name, attr_value);
                }
                let class = Class {
                    name: name.clone(),
                    attrs,
                };
                self.assign_name(name, Value::Class(Rc::new(class)))
                    .map_err(|fault| match fault {
                        Fault::Error(err) => Fault::Error(err.or_span(*span)),
                        other => other,
                    })?;
                Ok(ControlFlow::Normal)
            }
            Stmt::Return { value, span: _ } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::None,
                };
                Ok(ControlFlow::Return(value))
            }
            Stmt::Break { .. } => Ok(ControlFlow::Break),
            Stmt::Continue { .. } => Ok(ControlFlow::Continue),
            Stmt::Pass => Ok(ControlFlow::Normal),
            Stmt::Raise { value, span } => match value {
                Some(expr) => {
                    let value = self.evaluate(expr)?;
                    Err(RuntimeError::new(
                        ErrorKind::Raised,
                        value.display_str(),
                        *span,
                    )
                    .into())
                }
                None => match self.active_faults.last() {
                    Some(err) => Err(err.clone().into()),
                    None => Err(RuntimeError::new(
                        ErrorKind::Raised,
                        "no active exception to reraise",
                        *span,
                    )
                    .into()),
                },
            },
            Stmt::Assert {
                condition,
                message,
                span,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return Ok(ControlFlow::Normal);
                }
                let message = match message {
                    Some(expr) => self.evaluate(expr)?.display_str(),
                    None => String::new(),
                };
                Err(RuntimeError::new(ErrorKind::Assertion, message, *span).into())
            }
            Stmt::Import {
                module,
                alias,
                span,
            } => {
                let value = self
                    .find_module(module)
                    .ok_or_else(|| RuntimeError::import_error(module, *span))?;
                let bind_as = alias.as_ref().unwrap_or(module);
                self.assign_name(bind_as, value)?;
                Ok(ControlFlow::Normal)
            }
            Stmt::FromImport {
                module,
                names,
                span,
            } => {
                let value = self
                    .find_module(module)
                    .ok_or_else(|| RuntimeError::import_error(module, *span))?;
                let attrs = match &value {
                    Value::Module(m) => &m.attrs,
                    _ => return Err(RuntimeError::import_error(module, *span).into()),
                };
                for (name, alias) in names {
                    let attr = attrs.get(name.as_ref()).cloned().ok_or_else(|| {
                        RuntimeError::new(
                            ErrorKind::Import,
                            format!("cannot import name '{}' from '{}'", name, module),
                            *span,
                        )
                    })?;
                    let bind_as = alias.as_ref().unwrap_or(name);
                    self.assign_name(bind_as, attr)?;
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Global { names } => {
                if let Some(frame) = self.frames.last_mut() {
                    for name in names {
                        frame.globals.insert(name.to_string());
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::Nonlocal { names, span: _ } => {
                if let Some(frame) = self.frames.last_mut() {
                    for name in names {
                        frame.nonlocals.insert(name.to_string());
                    }
                }
                Ok(ControlFlow::Normal)
            }
            Stmt::With {
                context,
                alias,
                body,
            } => {
                let value = self.evaluate(context)?;
                if let Some(alias) = alias {
                    self.assign_name(alias, value)?;
                }
                self.exec_block(body)
            }
            Stmt::Try {
                body,
                handlers,
                finally,
            } => {
                let outcome = match self.exec_block(body) {
                    Err(Fault::Error(err)) => {
                        let mut handled = None;
                        for handler in handlers {
                            let matches = match &handler.kind {
                                None => true,
                                Some(kind) => err.matches_handler(kind),
                            };
                            if matches {
                                if let Some(alias) = &handler.alias {
                                    self.assign_name(alias, Value::str(&err.message))?;
                                }
                                self.active_faults.push(err.clone());
                                let result = self.exec_block(&handler.body);
                                self.active_faults.pop();
                                handled = Some(result);
                                break;
                            }
                        }
                        handled.unwrap_or(Err(Fault::Error(err)))
                    }
                    other => other,
                };
                if let Some(finally_body) = finally {
                    match self.exec_block(finally_body)? {
                        ControlFlow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                outcome
            }
        }
    }

    fn exec_aug_assign(
        &mut self,
        target: &Expr,
        op: BinaryOp,
        value: &Expr,
    ) -> Result<(), Fault> {
        let rhs = self.evaluate(value)?;
        match &target.kind {
            ExprKind::Name(name) => {
                let current = self.lookup_name(name, target.span)?;
                let updated = self.binary_op(current, op, rhs, target.span)?;
                self.assign_name(name, updated)
            }
            ExprKind::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                let current = self.index_get(&object, &index, target.span)?;
                let updated = self.binary_op(current, op, rhs, target.span)?;
                self.index_set(&object, &index, updated, target.span)
            }
            ExprKind::Attribute { object, name } => {
                let object = self.evaluate(object)?;
                let current = self.attr_get(&object, name, target.span)?;
                let updated = self.binary_op(current, op, rhs, target.span)?;
                self.attr_set(&object, name, updated, target.span)
            }
            _ => Err(RuntimeError::type_error(
                "cannot assign to this expression",
                target.span,
            )
            .into()),
        }
    }

    fn assign_to_target(&mut self, target: &Expr, value: Value) -> Result<(), Fault> {
        match &target.kind {
            ExprKind::Name(name) => self.assign_name(name, value),
            ExprKind::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                self.index_set(&object, &index, value, target.span)
            }
            ExprKind::Attribute { object, name } => {
                let object = self.evaluate(object)?;
                self.attr_set(&object, name, value, target.span)
            }
            _ => Err(RuntimeError::type_error(
                "cannot assign to this expression",
                target.span,
            )
            .into()),
        }
    }

    fn assign_name(&mut self, name: &str, value: Value) -> Result<(), Fault> {
        if let Some(frame) = self.frames.last() {
            if frame.globals.contains(name) {
                self.globals.set(name, value);
                return Ok(());
            }
            if frame.nonlocals.contains(name) {
                if self.env.update_enclosing(name, value) {
                    return Ok(());
                }
                return Err(RuntimeError::new(
                    ErrorKind::Name,
                    format!("no binding for nonlocal '{}' found", name),
                    Span::dummy(),
                )
                .into());
            }
        }
        self.env.set(name, value);
        Ok(())
    }

    fn lookup_name(&self, name: &str, span: Span) -> Result<Value, Fault> {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        if builtins::is_builtin(name) {
            return Ok(Value::Builtin(Rc::from(name)));
        }
        Err(RuntimeError::name_error(name, span).into())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, Fault> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Name(name) => self.lookup_name(name, expr.span),
            ExprKind::List(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate(element)?);
                }
                Ok(Value::list(items))
            }
            ExprKind::Tuple(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.evaluate(element)?);
                }
                Ok(Value::tuple(items))
            }
            ExprKind::Dict(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key_expr, value_expr) in entries {
                    let key = match self.evaluate(key_expr)? {
                        Value::Str(s) => s.to_string(),
                        other => {
                            return Err(RuntimeError::type_error(
                                format!(
                                    "dict keys must be strings, not '{}'",
                                    other.type_name()
                                ),
                                key_expr.span,
                            )
                            .into())
                        }
                    };
                    map.insert(key, self.evaluate(value_expr)?);
                }
                Ok(Value::Dict(Rc::new(RefCell::new(map))))
            }
            ExprKind::Set(elements) => {
                let mut items: Vec<Value> = Vec::with_capacity(elements.len());
                for element in elements {
                    let value = self.evaluate(element)?;
                    if !items.contains(&value) {
                        items.push(value);
                    }
                }
                Ok(Value::Set(Rc::new(RefCell::new(items))))
            }
            ExprKind::Attribute { object, name } => {
                let object = self.evaluate(object)?;
                self.attr_get(&object, name, expr.span)
            }
            ExprKind::Index { object, index } => {
                let object = self.evaluate(object)?;
                let index = self.evaluate(index)?;
                self.index_get(&object, &index, expr.span)
            }
            ExprKind::Call { callee, args } => {
                let callee_value = self.evaluate(callee)?;
                let mut argv = Vec::with_capacity(args.len());
                for arg in args {
                    argv.push(self.evaluate(arg)?);
                }
                self.call_value(callee_value, argv, expr.span)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => match value {
                        Value::Number(n, is_float) => Ok(Value::Number(-n, is_float)),
                        other => Err(RuntimeError::type_error(
                            format!("bad operand type for unary -: '{}'", other.type_name()),
                            expr.span,
                        )
                        .into()),
                    },
                    UnaryOp::Pos => match value {
                        Value::Number(..) => Ok(value),
                        other => Err(RuntimeError::type_error(
                            format!("bad operand type for unary +: '{}'", other.type_name()),
                            expr.span,
                        )
                        .into()),
                    },
                }
            }
            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.binary_op(left, *op, right, expr.span)
            }
            ExprKind::BoolOp { op, left, right } => {
                let left = self.evaluate(left)?;
                match op {
                    BoolOp::And => {
                        if left.is_truthy() {
                            self.evaluate(right)
                        } else {
                            Ok(left)
                        }
                    }
                    BoolOp::Or => {
                        if left.is_truthy() {
                            Ok(left)
                        } else {
                            self.evaluate(right)
                        }
                    }
                }
            }
            ExprKind::Compare { first, rest } => {
                let mut left = self.evaluate(first)?;
                for (op, right_expr) in rest {
                    let right = self.evaluate(right_expr)?;
                    if !self.compare(&left, *op, &right, right_expr.span)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::Lambda { params, body } => {
                let func = Function {
                    name: Rc::from("<lambda>"),
                    params: params.clone(),
                    body: FunctionBody::Expr(body.clone()),
                    env: self.env.clone(),
                };
                Ok(Value::Function(Rc::new(func)))
            }
        }
    }

    fn compare(&self, left: &Value, op: CmpOp, right: &Value, span: Span) -> Result<bool, Fault> {
        match op {
            CmpOp::Eq => Ok(left == right),
            CmpOp::NotEq => Ok(left != right),
            CmpOp::In => self.contains(right, left, span),
            CmpOp::NotIn => Ok(!self.contains(right, left, span)?),
            ordering_op => {
                let ordering = builtins::ordered_cmp(left, right).map_err(|_| {
                    RuntimeError::type_error(
                        format!(
                            "'{}' not supported between instances of '{}' and '{}'",
                            ordering_op.symbol(),
                            left.type_name(),
                            right.type_name()
                        ),
                        span,
                    )
                })?;
                let ordering = match ordering {
                    Some(ordering) => ordering,
                    None => return Ok(false),
                };
                Ok(match ordering_op {
                    CmpOp::Lt => ordering.is_lt(),
                    CmpOp::Gt => ordering.is_gt(),
                    CmpOp::LtEq => ordering.is_le(),
                    CmpOp::GtEq => ordering.is_ge(),
                    _ => unreachable!(),
                })
            }
        }
    }

    fn contains(&self, haystack: &Value, needle: &Value, span: Span) -> Result<bool, Fault> {
        match haystack {
            Value::Str(s) => match needle {
                Value::Str(sub) => Ok(s.contains(sub.as_ref())),
                other => Err(RuntimeError::type_error(
                    format!(
                        "'in <string>' requires string as left operand, not '{}'",
                        other.type_name()
                    ),
                    span,
                )
                .into()),
            },
            Value::List(items) => Ok(items.borrow().iter().any(|item| item == needle)),
            Value::Tuple(items) => Ok(items.iter().any(|item| item == needle)),
            Value::Set(items) => Ok(items.borrow().iter().any(|item| item == needle)),
            Value::Dict(map) => match needle {
                Value::Str(key) => Ok(map.borrow().contains_key(key.as_ref())),
                _ => Ok(false),
            },
            other => Err(RuntimeError::type_error(
                format!("argument of type '{}' is not iterable", other.type_name()),
                span,
            )
            .into()),
        }
    }

    fn binary_op(
        &self,
        left: Value,
        op: BinaryOp,
        right: Value,
        span: Span,
    ) -> Result<Value, Fault> {
        match (&left, &right) {
            (Value::Number(a, af), Value::Number(b, bf)) => {
                let is_float = *af || *bf;
                let result = match op {
                    BinaryOp::Add => Value::Number(a + b, is_float),
                    BinaryOp::Sub => Value::Number(a - b, is_float),
                    BinaryOp::Mul => Value::Number(a * b, is_float),
                    BinaryOp::Div => {
                        if *b == 0.0 {
                            return Err(RuntimeError::zero_division(span).into());
                        }
                        Value::float(a / b)
                    }
                    BinaryOp::FloorDiv => {
                        if *b == 0.0 {
                            return Err(RuntimeError::zero_division(span).into());
                        }
                        Value::Number((a / b).floor(), is_float)
                    }
                    BinaryOp::Mod => {
                        if *b == 0.0 {
                            return Err(RuntimeError::zero_division(span).into());
                        }
                        Value::Number(a - b * (a / b).floor(), is_float)
                    }
                    BinaryOp::Pow => Value::Number(a.powf(*b), is_float || *b < 0.0),
                };
                Ok(result)
            }
            (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
                Ok(Value::str(format!("{}{}", a, b)))
            }
            (Value::Str(s), Value::Number(n, false)) | (Value::Number(n, false), Value::Str(s))
                if op == BinaryOp::Mul =>
            {
                let count = (*n).max(0.0) as usize;
                Ok(Value::str(s.repeat(count)))
            }
            (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
                let mut items = a.borrow().clone();
                items.extend(b.borrow().iter().cloned());
                Ok(Value::list(items))
            }
            (Value::List(items), Value::Number(n, false))
            | (Value::Number(n, false), Value::List(items))
                if op == BinaryOp::Mul =>
            {
                let count = (*n).max(0.0) as usize;
                let source = items.borrow();
                let mut out = Vec::with_capacity(source.len() * count);
                for _ in 0..count {
                    out.extend(source.iter().cloned());
                }
                Ok(Value::list(out))
            }
            (Value::Tuple(a), Value::Tuple(b)) if op == BinaryOp::Add => {
                let mut items = a.as_ref().clone();
                items.extend(b.iter().cloned());
                Ok(Value::tuple(items))
            }
            _ => Err(RuntimeError::type_error(
                format!(
                    "unsupported operand type(s) for {}: '{}' and '{}'",
                    op.symbol(),
                    left.type_name(),
                    right.type_name()
                ),
                span,
            )
            .into()),
        }
    }

    fn index_get(&self, object: &Value, index: &Value, span: Span) -> Result<Value, Fault> {
        match object {
            Value::List(items) => {
                let items = items.borrow();
                let i = self.sequence_index(index, items.len(), "list", span)?;
                Ok(items[i].clone())
            }
            Value::Tuple(items) => {
                let i = self.sequence_index(index, items.len(), "tuple", span)?;
                Ok(items[i].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let i = self.sequence_index(index, chars.len(), "string", span)?;
                Ok(Value::str(chars[i].to_string()))
            }
            Value::Dict(map) => match index {
                Value::Str(key) => map
                    .borrow()
                    .get(key.as_ref())
                    .cloned()
                    .ok_or_else(|| RuntimeError::key_error(key, span).into()),
                other => Err(RuntimeError::type_error(
                    format!("dict keys must be strings, not '{}'", other.type_name()),
                    span,
                )
                .into()),
            },
            other => Err(RuntimeError::type_error(
                format!("'{}' object is not subscriptable", other.type_name()),
                span,
            )
            .into()),
        }
    }

    fn index_set(
        &self,
        object: &Value,
        index: &Value,
        value: Value,
        span: Span,
    ) -> Result<(), Fault> {
        match object {
            Value::List(items) => {
                let mut items = items.borrow_mut();
                let i = self.sequence_index(index, items.len(), "list", span)?;
                items[i] = value;
                Ok(())
            }
            Value::Dict(map) => match index {
                Value::Str(key) => {
                    map.borrow_mut().insert(key.to_string(), value);
                    Ok(())
                }
                other => Err(RuntimeError::type_error(
                    format!("dict keys must be strings, not '{}'", other.type_name()),
                    span,
                )
                .into()),
            },
            other => Err(RuntimeError::type_error(
                format!(
                    "'{}' object does not support item assignment",
                    other.type_name()
                ),
                span,
            )
            .into()),
        }
    }

    fn sequence_index(
        &self,
        index: &Value,
        len: usize,
        what: &str,
        span: Span,
    ) -> Result<usize, Fault> {
        let raw = match index {
            Value::Number(n, false) => *n as i64,
            other => {
                return Err(RuntimeError::type_error(
                    format!(
                        "{} indices must be integers, not '{}'",
                        what,
                        other.type_name()
                    ),
                    span,
                )
                .into())
            }
        };
        let len = len as i64;
        let resolved = if raw < 0 { raw + len } else { raw };
        if resolved < 0 || resolved >= len {
            return Err(
                RuntimeError::index_error(format!("{} index out of range", what), span).into(),
            );
        }
        Ok(resolved as usize)
    }

    fn attr_get(&self, object: &Value, name: &str, span: Span) -> Result<Value, Fault> {
        match object {
            Value::Module(module) => module.attrs.get(name).cloned().ok_or_else(|| {
                RuntimeError::new(
                    ErrorKind::Attribute,
                    format!("module '{}' has no attribute '{}'", module.name, name),
                    span,
                )
                .into()
            }),
            Value::Instance(instance) => {
                if let Some(value) = instance.fields.borrow().get(name) {
                    return Ok(value.clone());
                }
                match instance.class.attrs.get(name) {
                    Some(Value::Function(func)) => {
                        Ok(Value::BoundMethod(Rc::new(BoundMethod {
                            receiver: object.clone(),
                            method: MethodImpl::User(func.clone()),
                        })))
                    }
                    Some(value) => Ok(value.clone()),
                    None => Err(RuntimeError::attribute_error(
                        &instance.class.name,
                        name,
                        span,
                    )
                    .into()),
                }
            }
            Value::Class(class) => class.attrs.get(name).cloned().ok_or_else(|| {
                RuntimeError::attribute_error(&format!("type[{}]", class.name), name, span)
                    .into()
            }),
            Value::Str(_) if builtins::has_str_method(name) => self.bind_native(object, name),
            Value::List(_) if builtins::has_list_method(name) => self.bind_native(object, name),
            Value::Dict(_) if builtins::has_dict_method(name) => self.bind_native(object, name),
            Value::Set(_) if builtins::has_set_method(name) => self.bind_native(object, name),
            Value::Tuple(_) if builtins::has_tuple_method(name) => {
                self.bind_native(object, name)
            }
            other => {
                Err(RuntimeError::attribute_error(&other.type_name(), name, span).into())
            }
        }
    }

    fn bind_native(&self, receiver: &Value, name: &str) -> Result<Value, Fault> {
        Ok(Value::BoundMethod(Rc::new(BoundMethod {
            receiver: receiver.clone(),
            method: MethodImpl::Native(Rc::from(name)),
        })))
    }

    fn attr_set(
        &self,
        object: &Value,
        name: &str,
        value: Value,
        span: Span,
    ) -> Result<(), Fault> {
        match object {
            Value::Instance(instance) => {
                instance.fields.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(RuntimeError::type_error(
                format!(
                    "cannot set attribute '{}' on '{}' object",
                    name,
                    other.type_name()
                ),
                span,
            )
            .into()),
        }
    }

    fn call_value(&mut self, callee: Value, args: Vec<Value>, span: Span) -> Result<Value, Fault> {
        match callee {
            Value::Function(func) => self.call_function(&func, args, span),
            Value::Builtin(name) => self.call_builtin(&name, args, span),
            Value::BoundMethod(bound) => match &bound.method {
                MethodImpl::User(func) => {
                    let mut call_args = Vec::with_capacity(args.len() + 1);
                    call_args.push(bound.receiver.clone());
                    call_args.extend(args);
                    self.call_function(func, call_args, span)
                }
                MethodImpl::Native(name) => {
                    self.call_native_method(&bound.receiver, name, &args, span)
                }
            },
            Value::Class(class) => self.instantiate(&class, args, span),
            other => Err(RuntimeError::type_error(
                format!("'{}' object is not callable", other.type_name()),
                span,
            )
            .into()),
        }
    }

    fn call_function(
        &mut self,
        func: &Rc<Function>,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, Fault> {
        if self.depth >= RECURSION_LIMIT {
            return Err(RuntimeError::new(
                ErrorKind::Recursion,
                "maximum recursion depth exceeded",
                span,
            )
            .into());
        }
        if args.len() != func.params.len() {
            return Err(RuntimeError::type_error(
                format!(
                    "{}() takes {} argument(s) but {} were given",
                    func.name,
                    func.params.len(),
                    args.len()
                ),
                span,
            )
            .into());
        }
        let call_env = Environment::with_parent(Rc::new(func.env.clone()));
        for (param, arg) in func.params.iter().zip(args) {
            call_env.set(param.as_ref(), arg);
        }
        let saved_env = std::mem::replace(&mut self.env, call_env);
        self.frames.push(Frame::default());
        self.depth += 1;
        let result = match &func.body {
            FunctionBody::Block(stmts) => self.exec_block(stmts).map(|flow| match flow {
                ControlFlow::Return(value) => value,
                _ => Value::None,
            }),
            FunctionBody::Expr(expr) => self.evaluate(expr),
        };
        self.depth -= 1;
        self.frames.pop();
        self.env = saved_env;
        result
    }

    fn instantiate(
        &mut self,
        class: &Rc<Class>,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, Fault> {
        let instance = Value::Instance(Rc::new(Instance {
            class: class.clone(),
            fields: RefCell::new(IndexMap::new()),
        }));
        match class.attrs.get("__init__") {
            Some(Value::Function(init)) => {
                let mut call_args = Vec::with_capacity(args.len() + 1);
                call_args.push(instance.clone());
                call_args.extend(args);
                self.call_function(init, call_args, span)?;
            }
            _ => {
                if !args.is_empty() {
                    return Err(RuntimeError::type_error(
                        format!("{}() takes no arguments", class.name),
                        span,
                    )
                    .into());
                }
            }
        }
        Ok(instance)
    }

    fn call_native_method(
        &mut self,
        receiver: &Value,
        name: &str,
        args: &[Value],
        span: Span,
    ) -> Result<Value, Fault> {
        let result = match receiver {
            Value::Str(s) => builtins::str_method(s, name, args),
            Value::List(items) => builtins::list_method(items, name, args),
            Value::Dict(map) => builtins::dict_method(map, name, args),
            Value::Set(items) => builtins::set_method(items, name, args),
            Value::Tuple(items) => builtins::tuple_method(items, name, args),
            other => Err(RuntimeError::attribute_error(
                &other.type_name(),
                name,
                span,
            )),
        };
        result.map_err(|err| Fault::Error(err.or_span(span)))
    }

    fn call_builtin(&mut self, name: &str, args: Vec<Value>, span: Span) -> Result<Value, Fault> {
        if name == "exit" {
            let code = match args.first() {
                Some(Value::Number(n, _)) => *n as i32,
                _ => 0,
            };
            return Err(Fault::Exit(ExitRequest { code }));
        }
        if mathmod::is_math_builtin(name) {
            return mathmod::math_call(name, &args)
                .map_err(|err| Fault::Error(err.or_span(span)));
        }
        let result = match name {
            "print" => builtins::builtin_print(&args, &mut self.stdout),
            "input" => builtins::builtin_input(&args, &mut self.stdout),
            "help" => return self.builtin_help(&args),
            "len" => builtins::builtin_len(&args),
            "range" => builtins::builtin_range(&args),
            "abs" => builtins::builtin_abs(&args),
            "min" => builtins::builtin_min(&args),
            "max" => builtins::builtin_max(&args),
            "sum" => builtins::builtin_sum(&args),
            "sorted" => builtins::builtin_sorted(&args),
            "list" => builtins::builtin_list(&args),
            "tuple" => builtins::builtin_tuple(&args),
            "dict" => builtins::builtin_dict(&args),
            "set" => builtins::builtin_set(&args),
            "str" => builtins::builtin_str(&args),
            "int" => builtins::builtin_int(&args),
            "float" => builtins::builtin_float(&args),
            "bool" => builtins::builtin_bool(&args),
            "round" => builtins::builtin_round(&args),
            "type" => builtins::builtin_type(&args),
            other => Err(RuntimeError::name_error(other, span)),
        };
        result.map_err(|err| Fault::Error(err.or_span(span)))
    }

    fn builtin_help(&mut self, args: &[Value]) -> Result<Value, Fault> {
        match args.first() {
            Some(value) => {
                self.stdout
                    .push_str(&format!("object of type '{}'\n", value.type_name()));
            }
            None => {
                self.stdout.push_str("Available builtin functions:\n  ");
                self.stdout.push_str(&builtins::BUILTIN_NAMES.join(" "));
                self.stdout.push('\n');
            }
        }
        Ok(Value::None)
    }

    fn find_module(&self, name: &str) -> Option<Value> {
        match name {
            "math" => Some(mathmod::module()),
            other => extensions::load(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::parser::parse_program;

    fn run_host(source: &str) -> Interpreter {
        let stmts = parse_program(source).expect("parse failed");
        let mut interp = Interpreter::new(Environment::new());
        interp.run(&stmts).expect("execution failed");
        interp
    }

    fn host_output(source: &str) -> String {
        let mut interp = run_host(source);
        interp.take_stdout()
    }

    fn host_fault(source: &str) -> RuntimeError {
        let stmts = parse_program(source).expect("parse failed");
        let mut interp = Interpreter::new(Environment::new());
        match interp.run(&stmts) {
            Err(Fault::Error(err)) => err,
            other => panic!("expected fault, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_host_arithmetic_and_print() {
        assert_eq!(host_output("print(2 + 3 * 4)\n"), "14\n");
        assert_eq!(host_output("print(10 / 4)\n"), "2.5\n");
    }

    #[test]
    fn test_host_builtin_fallback_resolution() {
        // Builtins resolve after the namespace misses, like the host's
        // implicit builtin scope.
        assert_eq!(host_output("print(len('abc'))\n"), "3\n");
    }

    #[test]
    fn test_host_function_and_closure() {
        let source = "\
def outer(a):
    def inner(b):
        return a + b
    return inner
print(outer(1)(2))
";
        assert_eq!(host_output(source), "3\n");
    }

    #[test]
    fn test_host_bound_methods() {
        assert_eq!(host_output("print('oi'.upper())\n"), "OI\n");
        assert_eq!(
            host_output("l = [2, 1]\nl.sort()\nprint(l)\n"),
            "[1, 2]\n"
        );
    }

    #[test]
    fn test_host_class_dispatch() {
        let source = "\
class Par:
    def __init__(self, a, b):
        self.a = a
        self.b = b
    def soma(self):
        return self.a + self.b
print(Par(1, 2).soma())
";
        assert_eq!(host_output(source), "3\n");
    }

    #[test]
    fn test_host_fault_kinds() {
        assert_eq!(host_fault("1 / 0\n").kind, ErrorKind::ZeroDivision);
        assert_eq!(host_fault("desconhecido\n").kind, ErrorKind::Name);
        assert_eq!(host_fault("'a' + 1\n").kind, ErrorKind::Type);
    }

    #[test]
    fn test_host_recursion_guard() {
        let source = "\
def f():
    return f()
f()
";
        assert_eq!(host_fault(source).kind, ErrorKind::Recursion);
    }

    #[test]
    fn test_host_exit_propagates_as_exit_fault() {
        let stmts = parse_program("exit(9)\n").unwrap();
        let mut interp = Interpreter::new(Environment::new());
        match interp.run(&stmts) {
            Err(Fault::Exit(request)) => assert_eq!(request.code, 9),
            other => panic!("expected exit, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_host_echo_mode() {
        let stmts = parse_program("1 + 1\nx = 2\n").unwrap();
        let mut interp = Interpreter::with_echo(Environment::new());
        interp.run(&stmts).unwrap();
        assert_eq!(interp.take_stdout(), "2\n");
    }
}
