//! Convenience Globals
//!
//! The shorthand names short scripts rely on: `S`, `C` and `T` for
//! `Math.sin/cos/tan`, the `R()` color helper, and `escape`/`unescape`.

use rquickjs::function::Rest;
use rquickjs::{Ctx, Function, Object, Value};

use crate::bindings::number;
use crate::escape::{escape_units, unescape_units};

/// Install `S`, `C`, `T`, `R`, `escape` and `unescape`
pub fn install_globals(ctx: &Ctx) -> Result<(), rquickjs::Error> {
    let globals = ctx.globals();

    let math: Object = globals.get("Math")?;
    for (alias, name) in [("S", "sin"), ("C", "cos"), ("T", "tan")] {
        let function: Function = math.get(name)?;
        globals.set(alias, function)?;
    }

    // R(r, g, b, a = 1)
    globals.set(
        "R",
        Function::new(ctx.clone(), |args: Rest<Value>| -> Result<String, rquickjs::Error> {
            let alpha = match args.get(3) {
                Some(value) if !value.is_undefined() => number(Some(value)),
                _ => 1.0,
            };
            Ok(format_rgba(
                number(args.first()),
                number(args.get(1)),
                number(args.get(2)),
                alpha,
            ))
        })?,
    )?;

    install_escape(ctx)?;

    Ok(())
}

/// Script side of `escape`/`unescape`: moves UTF-16 code units in and out
/// of the engine so unpaired surrogates are neither rejected nor replaced.
/// A tagged template (escape`...`) passes its strings array; its first
/// element is the text.
const ESCAPE_GLUE: &str = r#"(function (g, escapeUnits, unescapeUnits) {
    function units(s) {
        s = String(s);
        var u = new Array(s.length);
        for (var i = 0; i < s.length; i++) u[i] = s.charCodeAt(i);
        return u;
    }
    function text(u) {
        var s = '';
        for (var i = 0; i < u.length; i += 4096)
            s += String.fromCharCode.apply(null, u.slice(i, i + 4096));
        return s;
    }
    g.escape = function escape(s) {
        if (Array.isArray(s) && Array.isArray(s.raw)) s = s[0];
        return escapeUnits(units(s));
    };
    g.unescape = function unescape(s) {
        return text(unescapeUnits(units(s)));
    };
})"#;

fn install_escape(ctx: &Ctx) -> Result<(), rquickjs::Error> {
    let escape_fn = Function::new(ctx.clone(), |units: Vec<u32>| {
        escape_units(&to_units(&units))
    })?;
    let unescape_fn = Function::new(ctx.clone(), |units: Vec<u32>| {
        unescape_units(&to_units(&units))
            .into_iter()
            .map(u32::from)
            .collect::<Vec<u32>>()
    })?;

    let install: Function = ctx.eval(ESCAPE_GLUE)?;
    install.call::<_, ()>((ctx.globals(), escape_fn, unescape_fn))
}

fn to_units(values: &[u32]) -> Vec<u16> {
    values.iter().map(|&unit| unit as u16).collect()
}

/// `rgba(r,g,b,a)` with integer channels and `%g`-style alpha
pub fn format_rgba(r: f64, g: f64, b: f64, a: f64) -> String {
    format!(
        "rgba({},{},{},{})",
        format_fixed0(r),
        format_fixed0(g),
        format_fixed0(b),
        format_g(a)
    )
}

fn format_non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("nan")
    } else if value == f64::INFINITY {
        Some("inf")
    } else if value == f64::NEG_INFINITY {
        Some("-inf")
    } else {
        None
    }
}

/// Like C's `%.0f`: round half to even, no decimal point
fn format_fixed0(value: f64) -> String {
    match format_non_finite(value) {
        Some(text) => text.to_string(),
        None => format!("{:.0}", value),
    }
}

/// Like C's `%g`: six significant digits, trailing zeros removed, exponent
/// form below 1e-4 and from 1e6 up
pub fn format_g(value: f64) -> String {
    const PRECISION: i32 = 6;

    if let Some(text) = format_non_finite(value) {
        return text.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", (PRECISION - 1) as usize, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= PRECISION {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let decimals = (PRECISION - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
