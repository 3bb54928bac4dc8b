//! Script Host
//!
//! Owns the QuickJS runtime, installs the canvas and convenience globals,
//! and runs the user program as the body of `function u(t)`, once per frame.

use std::cell::RefCell;
use std::rc::Rc;

use dwp_canvas::Canvas;
use rquickjs::context::EvalOptions;
use rquickjs::convert::Coerced;
use rquickjs::function::This;
use rquickjs::{Context, Ctx, FromJs, Function, Object, Persistent, Runtime, Value};

use crate::bindings::{self, SharedCanvas};
use crate::{console, globals, ScriptError};

/// Name of the per-frame entry function
const ENTRY: &str = "u";

/// Runs one script against one canvas.
///
/// Field order is drop order: the saved entry function must be released
/// before the context and runtime that own it.
pub struct ScriptHost {
    entry: Persistent<Function<'static>>,
    context: Context,
    runtime: Runtime,
    canvas: SharedCanvas,
}

impl ScriptHost {
    /// Create the engine, install bindings and compile `source`.
    ///
    /// Fails on engine errors, on a compile error in `source`, and when the
    /// canvas or its 2d context cannot be created.
    pub fn new(source: &str, width: u32, height: u32) -> Result<Self, ScriptError> {
        let canvas = Rc::new(RefCell::new(Canvas::new(width, height)?));

        let runtime = Runtime::new().map_err(engine_error)?;
        let context = Context::full(&runtime).map_err(engine_error)?;

        let entry = context.with(|ctx| -> Result<_, ScriptError> {
            console::install_console(&ctx).map_err(engine_error)?;
            globals::install_globals(&ctx).map_err(engine_error)?;
            bindings::install_canvas(&ctx, canvas.clone()).map_err(engine_error)?;
            bind_context(&ctx).map_err(|e| engine_exception(&ctx, e))?;

            let wrapped = format!("function {ENTRY}(t) {{\n{source}\n}}");
            eval_sloppy(&ctx, wrapped).map_err(|e| {
                let (message, stack) = exception_details(&ctx, e);
                ScriptError::Compile { message, stack }
            })?;

            let entry: Function = ctx
                .globals()
                .get(ENTRY)
                .map_err(|_| ScriptError::MissingEntry)?;
            Ok(Persistent::save(&ctx, entry))
        })?;

        tracing::debug!(bytes = source.len(), width, height, "Script compiled");

        Ok(Self {
            entry,
            context,
            runtime,
            canvas,
        })
    }

    /// Call `u(t)` once; `t` is elapsed time in seconds.
    ///
    /// Promise jobs queued during the call run before this returns.
    pub fn invoke(&self, t: f64) -> Result<(), ScriptError> {
        self.context.with(|ctx| {
            let entry = self.entry.clone().restore(&ctx).map_err(engine_error)?;
            entry
                .call::<_, Value>((This(ctx.globals()), t))
                .map(|_| ())
                .map_err(|e| {
                    let (message, stack) = exception_details(&ctx, e);
                    ScriptError::Exception { message, stack }
                })
        })?;

        loop {
            match self.runtime.execute_pending_job() {
                Ok(true) => continue,
                Ok(false) => break,
                Err(_) => {
                    tracing::warn!(target: "script", "Promise job raised an exception");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Evaluate extra code in the script's global scope and return its
    /// result as a string
    pub fn evaluate(&self, code: &str) -> Result<String, ScriptError> {
        self.context.with(|ctx| {
            eval_sloppy(&ctx, code)
                .and_then(|value| Coerced::<String>::from_js(&ctx, value))
                .map(|text| text.0)
                .map_err(|e| {
                    let (message, stack) = exception_details(&ctx, e);
                    ScriptError::Exception { message, stack }
                })
        })
    }

    /// The canvas the script draws into
    pub fn canvas(&self) -> &SharedCanvas {
        &self.canvas
    }

}

impl std::fmt::Debug for ScriptHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHost")
            .field("canvas", &self.canvas)
            .finish_non_exhaustive()
    }
}

/// `x = c.getContext("2d")`, done once at startup
fn bind_context(ctx: &Ctx<'_>) -> Result<(), rquickjs::Error> {
    let globals = ctx.globals();
    let element: Object = globals.get("c")?;
    let get_context: Function = element.get("getContext")?;
    let context: Value = get_context.call((This(element), "2d"))?;
    globals.set("x", context)
}

/// Evaluate in the global scope without strict mode; short scripts rely on
/// implicit globals such as `for(i=0;...)`
fn eval_sloppy<'js>(ctx: &Ctx<'js>, code: impl Into<Vec<u8>>) -> Result<Value<'js>, rquickjs::Error> {
    let mut options = EvalOptions::default();
    options.global = true;
    options.strict = false;
    ctx.eval_with_options(code, options)
}

fn engine_error(error: rquickjs::Error) -> ScriptError {
    ScriptError::Engine(error.to_string())
}

fn engine_exception(ctx: &Ctx<'_>, error: rquickjs::Error) -> ScriptError {
    let (message, _) = exception_details(ctx, error);
    ScriptError::Engine(message)
}

/// Message and stack of a raised exception.
///
/// Non-exception errors are reported by their description; thrown values
/// that are not `Error` objects are converted with `ToString`.
fn exception_details(ctx: &Ctx<'_>, error: rquickjs::Error) -> (String, Option<String>) {
    if !matches!(error, rquickjs::Error::Exception) {
        return (error.to_string(), None);
    }

    let thrown = ctx.catch();
    if let Some(exception) = thrown.as_exception() {
        let message = exception
            .message()
            .unwrap_or_else(|| "uncaught exception".to_string());
        let stack = exception.stack().filter(|stack| !stack.trim().is_empty());
        return (message, stack);
    }

    let message = Coerced::<String>::from_js(ctx, thrown)
        .map(|text| text.0)
        .unwrap_or_else(|_| "uncaught exception".to_string());
    (message, None)
}
