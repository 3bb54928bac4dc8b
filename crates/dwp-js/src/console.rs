//! Console API
//!
//! `console.log/info/warn/error/debug`, forwarded to `tracing` under the
//! `script` target.

use std::fmt::Write;

use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Value};

#[derive(Debug, Clone, Copy)]
enum Level {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

/// Install console API into the global object
pub fn install_console(ctx: &Ctx) -> Result<(), rquickjs::Error> {
    let console = Object::new(ctx.clone())?;

    for (name, level) in [
        ("log", Level::Log),
        ("info", Level::Info),
        ("warn", Level::Warn),
        ("error", Level::Error),
        ("debug", Level::Debug),
    ] {
        console.set(
            name,
            Function::new(ctx.clone(), move |args: Rest<Value>| {
                log_with_level(level, &args.0);
                Ok::<(), rquickjs::Error>(())
            })?,
        )?;
    }

    ctx.globals().set("console", console)?;
    Ok(())
}

fn log_with_level(level: Level, values: &[Value]) {
    let mut output = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            output.push(' ');
        }
        format_value(&mut output, value);
    }

    match level {
        Level::Error => tracing::error!(target: "script", "{}", output),
        Level::Warn => tracing::warn!(target: "script", "{}", output),
        Level::Debug => tracing::debug!(target: "script", "{}", output),
        Level::Log | Level::Info => tracing::info!(target: "script", "{}", output),
    }
}

/// Nesting shown for arrays before they collapse to `[...]`
const MAX_DEPTH: usize = 2;

/// Format a value the way a browser console prints it: strings bare,
/// numbers as JavaScript writes them, errors with their name, arrays
/// element by element
fn format_value(out: &mut String, value: &Value) {
    format_nested(out, value, 0);
}

fn format_nested(out: &mut String, value: &Value, depth: usize) {
    if let Some(n) = value.as_int() {
        write!(out, "{}", n).ok();
    } else if let Some(n) = value.as_float() {
        out.push_str(&format_number(n));
    } else if let Some(s) = value.as_string() {
        out.push_str(&s.to_string().unwrap_or_else(|_| "\u{fffd}".to_string()));
    } else if let Some(exception) = value.as_exception() {
        let name: Option<String> = exception.get("name").ok();
        let message = exception.message().unwrap_or_default();
        match name {
            Some(name) if message.is_empty() => out.push_str(&name),
            Some(name) => {
                write!(out, "{}: {}", name, message).ok();
            }
            None => out.push_str(&message),
        }
    } else if let Some(array) = value.as_array() {
        if depth >= MAX_DEPTH {
            out.push_str("[...]");
            return;
        }
        out.push('[');
        for (i, item) in array.iter::<Value>().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match item {
                Ok(item) => format_nested(out, &item, depth + 1),
                Err(_) => out.push('?'),
            }
        }
        out.push(']');
    } else if let Some(function) = value.as_function() {
        let name: String = function.get("name").unwrap_or_default();
        if name.is_empty() {
            out.push_str("[Function]");
        } else {
            write!(out, "[Function: {}]", name).ok();
        }
    } else if value.is_object() {
        out.push_str("[object Object]");
    } else if let Some(b) = value.as_bool() {
        write!(out, "{}", b).ok();
    } else if value.is_null() {
        out.push_str("null");
    } else {
        out.push_str("undefined");
    }
}

/// JavaScript `Number::toString` for the cases Rust prints differently
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    #[test]
    fn test_console_levels() {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();

        context.with(|ctx| {
            install_console(&ctx).unwrap();
            let _: Value = ctx
                .eval("console.log('log', 1); console.info('info'); console.warn('warn'); console.error(new Error('e')); console.debug('debug')")
                .unwrap();
        });
    }

    #[test]
    fn test_format_values() {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();

        context.with(|ctx| {
            let values: Vec<Value> = ctx
                .eval("[undefined, null, true, 42, 1.5, -0, NaN, 1/0, 'text', [1, [2, [3]]], function draw(){}, () => 0, {}, new TypeError('bad')]")
                .unwrap();
            let formatted: Vec<String> = values
                .iter()
                .map(|value| {
                    let mut out = String::new();
                    format_value(&mut out, value);
                    out
                })
                .collect();
            assert_eq!(
                formatted,
                [
                    "undefined",
                    "null",
                    "true",
                    "42",
                    "1.5",
                    "0",
                    "NaN",
                    "Infinity",
                    "text",
                    "[1, [2, [...]]]",
                    "[Function: draw]",
                    "[Function]",
                    "[object Object]",
                    "TypeError: bad",
                ]
            );
        });
    }
}
