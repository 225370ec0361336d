//! Input/output builtins. `print` writes to the call-scoped capture sink,
//! never directly to the process stream; `input` reads from the real stdin.

use std::rc::Rc;

use crate::interpreter::error::RuntimeError;
use crate::value::Value;

pub fn builtin_print(args: &[Value], out: &mut String) -> Result<Value, RuntimeError> {
    let parts: Vec<String> = args.iter().map(|value| value.display_str()).collect();
    out.push_str(&parts.join(" "));
    out.push('\n');
    Ok(Value::None)
}

pub fn builtin_input(args: &[Value], out: &mut String) -> Result<Value, RuntimeError> {
    use std::io::BufRead;
    if let Some(prompt) = args.first() {
        out.push_str(&prompt.display_str());
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| {
            RuntimeError::value_error(
                format!("failed to read input: {}", err),
                crate::diagnostic::Span::dummy(),
            )
        })?;
    Ok(Value::Str(Rc::from(line.trim_end_matches(['\n', '\r']))))
}
