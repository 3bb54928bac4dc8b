//! Canvas Bindings for JavaScript
//!
//! Exposes the shared [`Canvas`] as the global `c` and its 2D context as a
//! plain object with accessor properties and methods. Script objects only
//! hold a counted handle to the canvas, never a JS value, so the canvas and
//! its context are dropped once, together with the host.
//!
//! Arguments are converted before the canvas is borrowed, so `valueOf`
//! callbacks can run script code without re-entering a borrow.

use std::cell::RefCell;
use std::rc::Rc;

use dwp_canvas::{Canvas, RenderingContext};
use rquickjs::convert::Coerced;
use rquickjs::function::{Opt, Rest, This};
use rquickjs::object::{Accessor, Property};
use rquickjs::{Ctx, Exception, FromJs, Function, Object, Value};

/// Canvas shared between the bindings and the frame loop
pub type SharedCanvas = Rc<RefCell<Canvas>>;

/// Hidden property on `c` holding the cached context object
const CONTEXT_KEY: &str = "__context2d";

type NumericOp = fn(&mut RenderingContext, &[f64]);

/// Install the global canvas object `c`
pub fn install_canvas<'js>(ctx: &Ctx<'js>, canvas: SharedCanvas) -> Result<(), rquickjs::Error> {
    let element = Object::new(ctx.clone())?;

    // width / height: reads report the fixed size, any write resets the context
    let (get, set) = (canvas.clone(), canvas.clone());
    element.prop(
        "width",
        Accessor::new(
            move || get.borrow().width(),
            move |value: Coerced<f64>| set.borrow_mut().set_width(value.0),
        )
        .enumerable(),
    )?;
    let (get, set) = (canvas.clone(), canvas.clone());
    element.prop(
        "height",
        Accessor::new(
            move || get.borrow().height(),
            move |value: Coerced<f64>| set.borrow_mut().set_height(value.0),
        )
        .enumerable(),
    )?;

    let context = create_context_object(ctx, &canvas)?;
    context.set("canvas", element.clone())?;
    element.prop(CONTEXT_KEY, Property::from(context))?;

    // getContext(type): the cached 2d context object, or null
    let target = canvas.clone();
    element.set(
        "getContext",
        Function::new(
            ctx.clone(),
            move |this: This<Object<'js>>, kind: Opt<Coerced<String>>| -> Result<Value<'js>, rquickjs::Error> {
                let kind = kind.0.map(|kind| kind.0).unwrap_or_default();
                let created = target
                    .borrow_mut()
                    .get_context(&kind)
                    .map(|context| context.is_some());
                match created {
                    Ok(true) => this.0.get(CONTEXT_KEY),
                    Ok(false) => Ok(Value::new_null(this.0.ctx().clone())),
                    Err(e) => Err(Exception::throw_internal(this.0.ctx(), &e.to_string())),
                }
            },
        )?,
    )?;

    ctx.globals().set("c", element)?;
    Ok(())
}

/// Build the `CanvasRenderingContext2D`-like object
fn create_context_object<'js>(ctx: &Ctx<'js>, canvas: &SharedCanvas) -> Result<Object<'js>, rquickjs::Error> {
    let obj = Object::new(ctx.clone())?;

    // Properties
    string_property(&obj, canvas, "fillStyle", RenderingContext::fill_style, |c, v| c.set_fill_style(v))?;
    string_property(&obj, canvas, "strokeStyle", RenderingContext::stroke_style, |c, v| c.set_stroke_style(v))?;
    string_property(&obj, canvas, "font", RenderingContext::font, |c, v| c.set_font(v))?;
    number_property(&obj, canvas, "globalAlpha", RenderingContext::global_alpha, RenderingContext::set_global_alpha)?;
    number_property(&obj, canvas, "lineWidth", RenderingContext::line_width, RenderingContext::set_line_width)?;

    // Rectangles
    numeric_method(ctx, &obj, canvas, "fillRect", 4, |c, a| c.fill_rect(a[0], a[1], a[2], a[3]))?;
    numeric_method(ctx, &obj, canvas, "strokeRect", 4, |c, a| c.stroke_rect(a[0], a[1], a[2], a[3]))?;
    numeric_method(ctx, &obj, canvas, "clearRect", 4, |c, a| c.clear_rect(a[0], a[1], a[2], a[3]))?;

    // Paths
    numeric_method(ctx, &obj, canvas, "beginPath", 0, |c, _| c.begin_path())?;
    numeric_method(ctx, &obj, canvas, "closePath", 0, |c, _| c.close_path())?;
    numeric_method(ctx, &obj, canvas, "moveTo", 2, |c, a| c.move_to(a[0], a[1]))?;
    numeric_method(ctx, &obj, canvas, "lineTo", 2, |c, a| c.line_to(a[0], a[1]))?;
    numeric_method(ctx, &obj, canvas, "rect", 4, |c, a| c.rect(a[0], a[1], a[2], a[3]))?;
    numeric_method(ctx, &obj, canvas, "fill", 0, |c, _| c.fill())?;
    numeric_method(ctx, &obj, canvas, "stroke", 0, |c, _| c.stroke())?;

    // arc(x, y, r, start, end, counterclockwise)
    let target = canvas.clone();
    obj.set(
        "arc",
        Function::new(ctx.clone(), move |args: Rest<Value<'js>>| {
            let a: Vec<f64> = (0..5).map(|i| number(args.get(i))).collect();
            let counterclockwise = args
                .get(5)
                .and_then(|v| Coerced::<bool>::from_js(v.ctx(), v.clone()).ok())
                .is_some_and(|ccw| ccw.0);
            if let Some(context) = target.borrow_mut().context_mut() {
                context.arc(a[0], a[1], a[2], a[3], a[4], counterclockwise);
            }
            Ok::<(), rquickjs::Error>(())
        })?,
    )?;

    // State and transforms
    numeric_method(ctx, &obj, canvas, "save", 0, |c, _| c.save())?;
    numeric_method(ctx, &obj, canvas, "restore", 0, |c, _| c.restore())?;
    numeric_method(ctx, &obj, canvas, "scale", 2, |c, a| c.scale(a[0], a[1]))?;
    numeric_method(ctx, &obj, canvas, "translate", 2, |c, a| c.translate(a[0], a[1]))?;
    numeric_method(ctx, &obj, canvas, "rotate", 1, |c, a| c.rotate(a[0]))?;
    numeric_method(ctx, &obj, canvas, "setTransform", 6, |c, a| {
        c.set_transform(a[0], a[1], a[2], a[3], a[4], a[5])
    })?;
    numeric_method(ctx, &obj, canvas, "resetTransform", 0, |c, _| c.reset_transform())?;

    // fillText(text, x, y)
    let target = canvas.clone();
    obj.set(
        "fillText",
        Function::new(ctx.clone(), move |args: Rest<Value<'js>>| {
            // Text that is not valid Unicode has no glyphs to draw
            let Some(text) = string(args.first()) else {
                tracing::trace!("Ignoring fillText with unconvertible text");
                return Ok(());
            };
            let (x, y) = (number(args.get(1)), number(args.get(2)));
            if let Some(context) = target.borrow_mut().context_mut() {
                context.fill_text(&text, x, y);
            }
            Ok::<(), rquickjs::Error>(())
        })?,
    )?;

    Ok(obj)
}

/// Method taking `arity` numbers; missing arguments are NaN
fn numeric_method<'js>(
    ctx: &Ctx<'js>,
    target: &Object<'js>,
    canvas: &SharedCanvas,
    name: &str,
    arity: usize,
    op: NumericOp,
) -> Result<(), rquickjs::Error> {
    let canvas = canvas.clone();
    let function = Function::new(ctx.clone(), move |args: Rest<Value<'js>>| {
        let numbers: Vec<f64> = (0..arity).map(|i| number(args.get(i))).collect();
        if let Some(context) = canvas.borrow_mut().context_mut() {
            op(context, &numbers);
        }
        Ok::<(), rquickjs::Error>(())
    })?;
    target.set(name, function)
}

fn string_property<'js>(
    target: &Object<'js>,
    canvas: &SharedCanvas,
    name: &str,
    get: fn(&RenderingContext) -> String,
    set: fn(&mut RenderingContext, &str),
) -> Result<(), rquickjs::Error> {
    let (getter, setter) = (canvas.clone(), canvas.clone());
    target.prop(
        name,
        Accessor::new(
            move || getter.borrow().context().map(get).unwrap_or_default(),
            move |value: Coerced<String>| {
                if let Some(context) = setter.borrow_mut().context_mut() {
                    set(context, &value.0);
                }
            },
        )
        .enumerable(),
    )
}

fn number_property<'js>(
    target: &Object<'js>,
    canvas: &SharedCanvas,
    name: &str,
    get: fn(&RenderingContext) -> f64,
    set: fn(&mut RenderingContext, f64),
) -> Result<(), rquickjs::Error> {
    let (getter, setter) = (canvas.clone(), canvas.clone());
    target.prop(
        name,
        Accessor::new(
            move || getter.borrow().context().map(get).unwrap_or(f64::NAN),
            move |value: Coerced<f64>| {
                if let Some(context) = setter.borrow_mut().context_mut() {
                    set(context, value.0);
                }
            },
        )
        .enumerable(),
    )
}

/// `ToNumber` of an argument; NaN when absent or when conversion throws
pub(crate) fn number(value: Option<&Value<'_>>) -> f64 {
    value
        .and_then(|v| Coerced::<f64>::from_js(v.ctx(), v.clone()).ok())
        .map_or(f64::NAN, |n| n.0)
}

/// `ToString` of an argument
pub(crate) fn string(value: Option<&Value<'_>>) -> Option<String> {
    value
        .and_then(|v| Coerced::<String>::from_js(v.ctx(), v.clone()).ok())
        .map(|s| s.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn with_canvas(f: impl FnOnce(&Ctx, &SharedCanvas)) {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        let canvas = Rc::new(RefCell::new(Canvas::new(50, 50).unwrap()));

        context.with(|ctx| {
            install_canvas(&ctx, canvas.clone()).unwrap();
            f(&ctx, &canvas);
        });
    }

    #[test]
    fn test_canvas_object() {
        with_canvas(|ctx, _| {
            let size: Vec<u32> = ctx.eval("[c.width, c.height]").unwrap();
            assert_eq!(size, [50, 50]);
        });
    }

    #[test]
    fn test_get_context_identity() {
        with_canvas(|ctx, canvas| {
            let same: bool = ctx
                .eval("var a = c.getContext('2d'); a === c.getContext('2d') && a.canvas === c")
                .unwrap();
            assert!(same);
            assert!(canvas.borrow().context().is_some());
        });
    }

    #[test]
    fn test_unsupported_context_is_null() {
        with_canvas(|ctx, canvas| {
            let null: bool = ctx.eval("c.getContext('webgl') === null").unwrap();
            assert!(null);
            assert!(canvas.borrow().context().is_none());
        });
    }

    #[test]
    fn test_context_properties() {
        with_canvas(|ctx, _| {
            let style: String = ctx
                .eval("var x = c.getContext('2d'); x.fillStyle = 'hsl(120,100%,50%)'; x.fillStyle")
                .unwrap();
            assert_eq!(style, "#00ff00");

            let alpha: f64 = ctx.eval("x.globalAlpha = 7; x.globalAlpha").unwrap();
            assert_eq!(alpha, 1.0);

            let width: f64 = ctx.eval("x.lineWidth = '3'; x.lineWidth").unwrap();
            assert_eq!(width, 3.0);
        });
    }

    #[test]
    fn test_draw_calls_reach_canvas() {
        with_canvas(|ctx, canvas| {
            let _: Value = ctx
                .eval("var x = c.getContext('2d'); x.fillStyle = '#f00'; x.fillRect(0, 0, 10, 10)")
                .unwrap();
            let canvas = canvas.borrow();
            assert_eq!(canvas.frame().unwrap().pixel(5, 5), 0xFFFF0000);
        });
    }

    #[test]
    fn test_width_write_resets() {
        with_canvas(|ctx, canvas| {
            let _: Value = ctx
                .eval("var x = c.getContext('2d'); x.fillRect(0, 0, 50, 50); x.fillStyle = 'red'; c.width = 50")
                .unwrap();
            let canvas = canvas.borrow();
            let context = canvas.context().unwrap();
            assert_eq!(context.fill_style(), "#000000");
            assert_eq!(context.frame().pixel(25, 25), 0xFFFFFFFF);
        });
    }

    #[test]
    fn test_value_of_may_draw() {
        with_canvas(|ctx, canvas| {
            let _: Value = ctx
                .eval("var x = c.getContext('2d'); x.fillRect({ valueOf() { x.fillRect(40, 40, 5, 5); return 0 } }, 0, 5, 5)")
                .unwrap();
            let canvas = canvas.borrow();
            assert_eq!(canvas.frame().unwrap().pixel(42, 42), 0xFF000000);
            assert_eq!(canvas.frame().unwrap().pixel(2, 2), 0xFF000000);
        });
    }
}
