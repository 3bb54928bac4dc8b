//! Current Path
//!
//! Path construction for the canvas context. Points are mapped through the
//! transform that is current when they are added, so the stored commands
//! are in device space, as a browser does it.

use std::f64::consts::{FRAC_PI_2, TAU};

use crate::transform::TransformMatrix;

/// A point in device space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn mapped(transform: &TransformMatrix, x: f64, y: f64) -> Self {
        let (x, y) = transform.transform_point(x, y);
        Self { x, y }
    }
}

/// Path command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo(Point, Point, Point),
    ClosePath,
}

/// Ordered sequence of path commands
#[derive(Debug, Clone, Default)]
pub struct Path {
    commands: Vec<PathCommand>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl Path {
    /// Create new empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Get commands
    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Last point of the current subpath, if there is one
    pub fn current_point(&self) -> Option<Point> {
        self.current
    }

    /// Start a new subpath
    pub fn move_to(&mut self, transform: &TransformMatrix, x: f64, y: f64) {
        self.move_to_point(Point::mapped(transform, x, y));
    }

    /// Line to point; behaves as `move_to` on an empty path
    pub fn line_to(&mut self, transform: &TransformMatrix, x: f64, y: f64) {
        self.line_to_point(Point::mapped(transform, x, y));
    }

    /// Close the current subpath
    pub fn close_path(&mut self) {
        let Some(start) = self.subpath_start else {
            return;
        };
        self.commands.push(PathCommand::ClosePath);
        self.current = Some(start);
    }

    /// Closed rectangle subpath; the current point ends at `(x, y)`
    pub fn rect(&mut self, transform: &TransformMatrix, x: f64, y: f64, w: f64, h: f64) {
        self.move_to(transform, x, y);
        self.line_to(transform, x + w, y);
        self.line_to(transform, x + w, y + h);
        self.line_to(transform, x, y + h);
        self.close_path();
        self.move_to(transform, x, y);
    }

    /// Circular arc around `(cx, cy)`.
    ///
    /// The arc is joined to the current point with a straight line. Sweeps
    /// that cover a full turn in the requested direction draw a full circle;
    /// otherwise the sweep is reduced modulo 2π. Each quarter turn becomes
    /// one cubic segment.
    pub fn arc(
        &mut self,
        transform: &TransformMatrix,
        cx: f64,
        cy: f64,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        counterclockwise: bool,
    ) {
        let start = Point::mapped(
            transform,
            cx + radius * start_angle.cos(),
            cy + radius * start_angle.sin(),
        );
        if self.current.is_some() {
            self.line_to_point(start);
        } else {
            self.move_to_point(start);
        }

        let sweep = arc_sweep(start_angle, end_angle, counterclockwise);
        if radius == 0.0 || sweep == 0.0 {
            return;
        }

        let segments = (sweep.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / segments as f64;
        let k = 4.0 / 3.0 * (step / 4.0).tan();

        let mut angle = start_angle;
        for _ in 0..segments {
            let next = angle + step;
            let (sin0, cos0) = angle.sin_cos();
            let (sin1, cos1) = next.sin_cos();

            let p1 = Point::mapped(
                transform,
                cx + radius * (cos0 - k * sin0),
                cy + radius * (sin0 + k * cos0),
            );
            let p2 = Point::mapped(
                transform,
                cx + radius * (cos1 + k * sin1),
                cy + radius * (sin1 - k * cos1),
            );
            let p3 = Point::mapped(transform, cx + radius * cos1, cy + radius * sin1);

            self.commands.push(PathCommand::CubicTo(p1, p2, p3));
            self.current = Some(p3);
            angle = next;
        }
    }

    /// Copy of this path with every point mapped through `transform`
    pub fn transformed(&self, transform: &TransformMatrix) -> Path {
        let map = |p: Point| Point::mapped(transform, p.x, p.y);
        Path {
            commands: self
                .commands
                .iter()
                .map(|command| match *command {
                    PathCommand::MoveTo(p) => PathCommand::MoveTo(map(p)),
                    PathCommand::LineTo(p) => PathCommand::LineTo(map(p)),
                    PathCommand::CubicTo(p1, p2, p) => PathCommand::CubicTo(map(p1), map(p2), map(p)),
                    PathCommand::ClosePath => PathCommand::ClosePath,
                })
                .collect(),
            current: self.current.map(map),
            subpath_start: self.subpath_start.map(map),
        }
    }

    /// Build a tiny-skia path; `None` when there is nothing to draw
    pub fn to_skia(&self) -> Option<tiny_skia::Path> {
        let mut builder = tiny_skia::PathBuilder::new();
        for command in &self.commands {
            match *command {
                PathCommand::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
                PathCommand::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
                PathCommand::CubicTo(p1, p2, p) => builder.cubic_to(
                    p1.x as f32, p1.y as f32,
                    p2.x as f32, p2.y as f32,
                    p.x as f32, p.y as f32,
                ),
                PathCommand::ClosePath => builder.close(),
            }
        }
        builder.finish()
    }

    fn move_to_point(&mut self, point: Point) {
        self.commands.push(PathCommand::MoveTo(point));
        self.current = Some(point);
        self.subpath_start = Some(point);
    }

    fn line_to_point(&mut self, point: Point) {
        if self.current.is_none() {
            self.move_to_point(point);
            return;
        }
        self.commands.push(PathCommand::LineTo(point));
        self.current = Some(point);
    }
}

/// Signed sweep of an arc in radians; negative is counterclockwise
pub fn arc_sweep(start_angle: f64, end_angle: f64, counterclockwise: bool) -> f64 {
    if !counterclockwise && end_angle - start_angle >= TAU {
        return TAU;
    }
    if counterclockwise && start_angle - end_angle >= TAU {
        return -TAU;
    }

    let sweep = (end_angle - start_angle).rem_euclid(TAU);
    if counterclockwise && sweep > 0.0 {
        sweep - TAU
    } else {
        sweep
    }
}
