//! Built-in functions
//!
//! Host functions callable from scripts. Each entry declares a fixed arity
//! and whether it returns a value, so calls are checked when the program is
//! compiled rather than when it runs.

use crate::context::ScriptContext;
use crate::lang::bytecode::{BuiltinDescriptor, Value};
use crate::{Result, ScriptError};
use std::collections::HashMap;
use std::fmt;
use tickscript_core::{Color, Triangle};

/// Host function signature. Returns `Some` exactly when the builtin was
/// registered as returning a value.
pub type BuiltinFn = fn(&ScriptContext, &[Value]) -> Result<Option<Value>>;

/// A registered builtin
#[derive(Clone)]
pub struct Builtin {
    pub name: String,
    pub arity: usize,
    pub returns_value: bool,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("returns_value", &self.returns_value)
            .finish_non_exhaustive()
    }
}

/// Built-in function registry
#[derive(Debug, Clone)]
pub struct Builtins {
    functions: HashMap<String, Builtin>,
}

impl Builtins {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Registry with the standard host functions
    pub fn standard() -> Self {
        let mut builtins = Self::new();

        register_host_functions(&mut builtins);
        register_math_functions(&mut builtins);

        builtins
    }

    /// Register a builtin, replacing any previous entry with the same name
    pub fn register(&mut self, name: &str, arity: usize, returns_value: bool, func: BuiltinFn) {
        self.functions.insert(
            name.to_string(),
            Builtin {
                name: name.to_string(),
                arity,
                returns_value,
                func,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.functions.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a call site into the descriptor embedded in the bytecode
    pub fn descriptor(
        &self,
        name: &str,
        argc: usize,
        produces_value: bool,
    ) -> Result<BuiltinDescriptor> {
        let builtin = self
            .get(name)
            .ok_or_else(|| ScriptError::UnknownFunction(name.to_string()))?;

        if builtin.arity != argc {
            return Err(ScriptError::ArityMismatch {
                name: name.to_string(),
                expected: builtin.arity,
                found: argc,
            });
        }

        if produces_value && !builtin.returns_value {
            return Err(ScriptError::NoReturnValue(name.to_string()));
        }

        Ok(BuiltinDescriptor {
            name: builtin.name.clone(),
            arity: builtin.arity,
            produces_value,
        })
    }

    /// Call a builtin by name
    pub fn call(&self, ctx: &ScriptContext, name: &str, args: &[Value]) -> Result<Option<Value>> {
        let builtin = self
            .get(name)
            .ok_or_else(|| ScriptError::UnknownFunction(name.to_string()))?;
        (builtin.func)(ctx, args)
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::standard()
    }
}

/// Register functions that talk to the host
fn register_host_functions(builtins: &mut Builtins) {
    builtins.register("Print", 1, false, builtin_print);
    builtins.register("DrawTriangle", 6, false, builtin_draw_triangle);
}

/// Register math functions
fn register_math_functions(builtins: &mut Builtins) {
    builtins.register("Abs", 1, true, builtin_abs);
    builtins.register("Sqrt", 1, true, builtin_sqrt);
    builtins.register("Min", 2, true, builtin_min);
    builtins.register("Max", 2, true, builtin_max);
    builtins.register("Pow", 2, true, builtin_pow);
}

fn number_arg(name: &str, args: &[Value], index: usize) -> Result<f64> {
    let value = args.get(index).ok_or_else(|| {
        ScriptError::RuntimeFault(format!("{} is missing argument {}", name, index + 1))
    })?;

    value.as_number().ok_or_else(|| {
        ScriptError::RuntimeFault(format!(
            "{} expects a number for argument {} but got {}",
            name,
            index + 1,
            value.kind_name()
        ))
    })
}

// ============================================================================
// HOST FUNCTIONS
// ============================================================================

fn builtin_print(ctx: &ScriptContext, args: &[Value]) -> Result<Option<Value>> {
    let value = args
        .first()
        .ok_or_else(|| ScriptError::RuntimeFault("Print is missing its argument".into()))?;
    ctx.print(value.to_string());
    Ok(None)
}

fn builtin_draw_triangle(ctx: &ScriptContext, args: &[Value]) -> Result<Option<Value>> {
    let mut nums = [0.0; 6];
    for (i, slot) in nums.iter_mut().enumerate() {
        *slot = number_arg("DrawTriangle", args, i)?;
    }
    let [x, y, radius, r, g, b] = nums;

    ctx.draw_triangle(Triangle::new(x, y, radius, Color::new(r, g, b).clamped()));
    Ok(None)
}

// ============================================================================
// MATH FUNCTIONS
// ============================================================================

fn builtin_abs(_ctx: &ScriptContext, args: &[Value]) -> Result<Option<Value>> {
    let x = number_arg("Abs", args, 0)?;
    Ok(Some(Value::Number(x.abs())))
}

fn builtin_sqrt(_ctx: &ScriptContext, args: &[Value]) -> Result<Option<Value>> {
    let x = number_arg("Sqrt", args, 0)?;
    Ok(Some(Value::Number(x.sqrt())))
}

fn builtin_min(_ctx: &ScriptContext, args: &[Value]) -> Result<Option<Value>> {
    let a = number_arg("Min", args, 0)?;
    let b = number_arg("Min", args, 1)?;
    Ok(Some(Value::Number(a.min(b))))
}

fn builtin_max(_ctx: &ScriptContext, args: &[Value]) -> Result<Option<Value>> {
    let a = number_arg("Max", args, 0)?;
    let b = number_arg("Max", args, 1)?;
    Ok(Some(Value::Number(a.max(b))))
}

fn builtin_pow(_ctx: &ScriptContext, args: &[Value]) -> Result<Option<Value>> {
    let base = number_arg("Pow", args, 0)?;
    let exp = number_arg("Pow", args, 1)?;
    Ok(Some(Value::Number(base.powf(exp))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_names() {
        let builtins = Builtins::standard();
        assert_eq!(
            builtins.names(),
            vec!["Abs", "DrawTriangle", "Max", "Min", "Pow", "Print", "Sqrt"]
        );
    }

    #[test]
    fn test_print() {
        let builtins = Builtins::standard();
        let ctx = ScriptContext::new();

        let result = builtins.call(&ctx, "Print", &[Value::Number(62.0)]).unwrap();
        assert!(result.is_none());
        builtins.call(&ctx, "Print", &[Value::Bool(false)]).unwrap();

        assert_eq!(ctx.take_console(), vec!["62", "false"]);
    }

    #[test]
    fn test_draw_triangle() {
        let builtins = Builtins::standard();
        let ctx = ScriptContext::new();
        let args: Vec<Value> = [1.0, 2.0, 0.5, 1.0, 0.5, 0.0]
            .into_iter()
            .map(Value::Number)
            .collect();

        builtins.call(&ctx, "DrawTriangle", &args).unwrap();

        let triangles = ctx.take_triangles();
        assert_eq!(
            triangles,
            vec![Triangle::new(1.0, 2.0, 0.5, Color::new(1.0, 0.5, 0.0))]
        );
    }

    #[test]
    fn test_draw_triangle_rejects_bool() {
        let builtins = Builtins::standard();
        let ctx = ScriptContext::new();
        let mut args = vec![Value::Number(0.0); 6];
        args[3] = Value::Bool(true);

        let err = builtins.call(&ctx, "DrawTriangle", &args).unwrap_err();
        assert!(err.is_runtime());
        assert!(ctx.take_triangles().is_empty());
    }

    #[test]
    fn test_math() {
        let builtins = Builtins::standard();
        let ctx = ScriptContext::new();
        let call = |name: &str, args: &[f64]| {
            let args: Vec<Value> = args.iter().copied().map(Value::Number).collect();
            builtins.call(&ctx, name, &args).unwrap()
        };

        assert_eq!(call("Abs", &[-3.0]), Some(Value::Number(3.0)));
        assert_eq!(call("Sqrt", &[16.0]), Some(Value::Number(4.0)));
        assert_eq!(call("Min", &[2.0, 7.0]), Some(Value::Number(2.0)));
        assert_eq!(call("Max", &[2.0, 7.0]), Some(Value::Number(7.0)));
        assert_eq!(call("Pow", &[2.0, 10.0]), Some(Value::Number(1024.0)));
    }

    #[test]
    fn test_descriptor_checks() {
        let builtins = Builtins::standard();

        let desc = builtins.descriptor("Print", 1, false).unwrap();
        assert_eq!(desc.name, "Print");
        assert_eq!(desc.arity, 1);
        assert!(!desc.produces_value);

        // Value-returning builtins may still be used as statements
        assert!(builtins.descriptor("Max", 2, false).is_ok());

        assert!(matches!(
            builtins.descriptor("Nope", 0, false),
            Err(ScriptError::UnknownFunction(_))
        ));
        assert!(matches!(
            builtins.descriptor("Print", 2, false),
            Err(ScriptError::ArityMismatch { expected: 1, found: 2, .. })
        ));
        assert!(matches!(
            builtins.descriptor("Print", 1, true),
            Err(ScriptError::NoReturnValue(_))
        ));
    }

    #[test]
    fn test_register_custom() {
        fn answer(_ctx: &ScriptContext, _args: &[Value]) -> Result<Option<Value>> {
            Ok(Some(Value::Number(42.0)))
        }

        let mut builtins = Builtins::new();
        assert!(builtins.names().is_empty());
        assert!(Builtins::default().get("Print").is_some());
        assert!(builtins.get("Answer").is_none());
        builtins.register("Answer", 0, true, answer);

        let ctx = ScriptContext::new();
        assert_eq!(
            builtins.call(&ctx, "Answer", &[]).unwrap(),
            Some(Value::Number(42.0))
        );
    }
}
