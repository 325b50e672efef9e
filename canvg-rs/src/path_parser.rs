//! Path data (`d` attribute) tokenizing and the stateful walker shared by
//! path rendering, glyph outlines and text-on-path layout.

use crate::geometry::{vectors_angle, vectors_ratio, Point};
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { relative: bool, x: f64, y: f64 },
    LineTo { relative: bool, x: f64, y: f64 },
    HorizLineTo { relative: bool, x: f64 },
    VertLineTo { relative: bool, y: f64 },
    CurveTo { relative: bool, x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    SmoothCurveTo { relative: bool, x2: f64, y2: f64, x: f64, y: f64 },
    QuadTo { relative: bool, x1: f64, y1: f64, x: f64, y: f64 },
    SmoothQuadTo { relative: bool, x: f64, y: f64 },
    Arc {
        relative: bool,
        rx: f64,
        ry: f64,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    ClosePath,
}

impl PathCommand {
    pub fn is_relative(&self) -> bool {
        match *self {
            PathCommand::MoveTo { relative, .. }
            | PathCommand::LineTo { relative, .. }
            | PathCommand::HorizLineTo { relative, .. }
            | PathCommand::VertLineTo { relative, .. }
            | PathCommand::CurveTo { relative, .. }
            | PathCommand::SmoothCurveTo { relative, .. }
            | PathCommand::QuadTo { relative, .. }
            | PathCommand::SmoothQuadTo { relative, .. }
            | PathCommand::Arc { relative, .. } => relative,
            PathCommand::ClosePath => false,
        }
    }

    fn is_cubic(&self) -> bool {
        matches!(self, PathCommand::CurveTo { .. } | PathCommand::SmoothCurveTo { .. })
    }

    fn is_quadratic(&self) -> bool {
        matches!(self, PathCommand::QuadTo { .. } | PathCommand::SmoothQuadTo { .. })
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = |upper: char, relative: bool| {
            if relative {
                upper.to_ascii_lowercase()
            } else {
                upper
            }
        };
        match *self {
            PathCommand::MoveTo { relative, x, y } => write!(f, "{} {x} {y}", letter('M', relative)),
            PathCommand::LineTo { relative, x, y } => write!(f, "{} {x} {y}", letter('L', relative)),
            PathCommand::HorizLineTo { relative, x } => write!(f, "{} {x}", letter('H', relative)),
            PathCommand::VertLineTo { relative, y } => write!(f, "{} {y}", letter('V', relative)),
            PathCommand::CurveTo { relative, x1, y1, x2, y2, x, y } => {
                write!(f, "{} {x1} {y1} {x2} {y2} {x} {y}", letter('C', relative))
            }
            PathCommand::SmoothCurveTo { relative, x2, y2, x, y } => {
                write!(f, "{} {x2} {y2} {x} {y}", letter('S', relative))
            }
            PathCommand::QuadTo { relative, x1, y1, x, y } => {
                write!(f, "{} {x1} {y1} {x} {y}", letter('Q', relative))
            }
            PathCommand::SmoothQuadTo { relative, x, y } => write!(f, "{} {x} {y}", letter('T', relative)),
            PathCommand::Arc {
                relative,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => write!(
                f,
                "{} {rx} {ry} {x_axis_rotation} {} {} {x} {y}",
                letter('A', relative),
                large_arc as u8,
                sweep as u8
            ),
            PathCommand::ClosePath => f.write_str("Z"),
        }
    }
}

/// Serializes commands back into path data.
pub fn to_path_data(commands: &[PathCommand]) -> String {
    commands
        .iter()
        .map(|command| command.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

struct Tokenizer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            bytes: data.as_bytes(),
            pos: 0,
        }
    }

    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_separators();
        self.pos >= self.bytes.len()
    }

    fn peek_command(&mut self) -> Option<u8> {
        self.skip_separators();
        self.bytes
            .get(self.pos)
            .copied()
            .filter(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E'))
    }

    fn starts_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'))
    }

    fn number(&mut self) -> Option<f64> {
        self.skip_separators();
        let start = self.pos;
        let at = |pos: usize| self.bytes.get(pos).copied();
        let mut end = start;
        if matches!(at(end), Some(b'-' | b'+')) {
            end += 1;
        }
        let mut digits = 0;
        while matches!(at(end), Some(b) if b.is_ascii_digit()) {
            end += 1;
            digits += 1;
        }
        if at(end) == Some(b'.') {
            end += 1;
            while matches!(at(end), Some(b) if b.is_ascii_digit()) {
                end += 1;
                digits += 1;
            }
        }
        if digits == 0 {
            return None;
        }
        if matches!(at(end), Some(b'e' | b'E')) {
            let mut exp_end = end + 1;
            if matches!(at(exp_end), Some(b'-' | b'+')) {
                exp_end += 1;
            }
            let exp_start = exp_end;
            while matches!(at(exp_end), Some(b) if b.is_ascii_digit()) {
                exp_end += 1;
            }
            if exp_end > exp_start {
                end = exp_end;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..end]).ok()?;
        let value = text.parse().ok()?;
        self.pos = end;
        Some(value)
    }

    fn flag(&mut self) -> Option<bool> {
        self.skip_separators();
        let flag = match self.bytes.get(self.pos) {
            Some(b'0') => false,
            Some(b'1') => true,
            _ => return None,
        };
        self.pos += 1;
        Some(flag)
    }
}

/// Parses path data. Parsing stops at the first malformed segment and the
/// commands read so far are kept.
pub fn parse_path_data(data: &str) -> Vec<PathCommand> {
    let mut tokenizer = Tokenizer::new(data);
    let mut commands = Vec::new();
    let mut current: Option<u8> = None;

    while !tokenizer.at_end() {
        let letter = match tokenizer.peek_command() {
            Some(letter) => {
                tokenizer.pos += 1;
                letter
            }
            None if tokenizer.starts_number() => match current {
                // Extra coordinate pairs after a moveto are implicit linetos.
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(b'Z' | b'z') | None => break,
                Some(letter) => letter,
            },
            None => break,
        };
        current = Some(letter);
        match read_command(&mut tokenizer, letter) {
            Some(command) => commands.push(command),
            None => {
                log::debug!(
                    target: "canvg::parser",
                    "path data malformed near byte {}, keeping {} segments",
                    tokenizer.pos,
                    commands.len()
                );
                break;
            }
        }
    }
    commands
}

fn read_command(t: &mut Tokenizer<'_>, letter: u8) -> Option<PathCommand> {
    let relative = letter.is_ascii_lowercase();
    let command = match letter.to_ascii_uppercase() {
        b'M' => PathCommand::MoveTo {
            relative,
            x: t.number()?,
            y: t.number()?,
        },
        b'L' => PathCommand::LineTo {
            relative,
            x: t.number()?,
            y: t.number()?,
        },
        b'H' => PathCommand::HorizLineTo {
            relative,
            x: t.number()?,
        },
        b'V' => PathCommand::VertLineTo {
            relative,
            y: t.number()?,
        },
        b'C' => PathCommand::CurveTo {
            relative,
            x1: t.number()?,
            y1: t.number()?,
            x2: t.number()?,
            y2: t.number()?,
            x: t.number()?,
            y: t.number()?,
        },
        b'S' => PathCommand::SmoothCurveTo {
            relative,
            x2: t.number()?,
            y2: t.number()?,
            x: t.number()?,
            y: t.number()?,
        },
        b'Q' => PathCommand::QuadTo {
            relative,
            x1: t.number()?,
            y1: t.number()?,
            x: t.number()?,
            y: t.number()?,
        },
        b'T' => PathCommand::SmoothQuadTo {
            relative,
            x: t.number()?,
            y: t.number()?,
        },
        b'A' => PathCommand::Arc {
            relative,
            rx: t.number()?,
            ry: t.number()?,
            x_axis_rotation: t.number()?,
            large_arc: t.flag()?,
            sweep: t.flag()?,
            x: t.number()?,
            y: t.number()?,
        },
        b'Z' => PathCommand::ClosePath,
        _ => return None,
    };
    Some(command)
}

/// The geometry of one cubic segment.
#[derive(Debug, Clone, Copy)]
pub struct CubicStep {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy)]
pub struct QuadStep {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

/// An arc converted to center parameterization.
#[derive(Debug, Clone, Copy)]
pub struct ArcStep {
    pub start: Point,
    pub end: Point,
    pub rx: f64,
    pub ry: f64,
    pub sweep: bool,
    /// Radians.
    pub x_axis_rotation: f64,
    pub center: Point,
    pub start_angle: f64,
    pub delta: f64,
    /// One of the radii is zero; the segment degenerates to a line.
    pub is_line: bool,
}

/// Walks path commands tracking current, start and control points and
/// collecting marker positions.
#[derive(Debug, Clone)]
pub struct PathParser<'a> {
    commands: &'a [PathCommand],
    next_index: usize,
    command: Option<PathCommand>,
    previous_command: Option<PathCommand>,
    pub start: Point,
    pub control: Point,
    pub current: Point,
    points: Vec<Point>,
    angles: Vec<Option<f64>>,
}

impl<'a> PathParser<'a> {
    pub fn new(commands: &'a [PathCommand]) -> Self {
        Self {
            commands,
            next_index: 0,
            command: None,
            previous_command: None,
            start: Point::default(),
            control: Point::default(),
            current: Point::default(),
            points: Vec::new(),
            angles: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.next_index = 0;
        self.command = None;
        self.previous_command = None;
        self.start = Point::default();
        self.control = Point::default();
        self.current = Point::default();
        self.points.clear();
        self.angles.clear();
    }

    pub fn is_end(&self) -> bool {
        self.next_index >= self.commands.len()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<PathCommand> {
        let command = self.commands.get(self.next_index).copied();
        self.next_index += 1;
        self.previous_command = self.command;
        self.command = command;
        command
    }

    pub fn command(&self) -> Option<PathCommand> {
        self.command
    }

    fn make_absolute(&self, point: Point) -> Point {
        if self.command.is_some_and(|c| c.is_relative()) {
            Point::new(point.x + self.current.x, point.y + self.current.y)
        } else {
            point
        }
    }

    fn point(&self, x: f64, y: f64) -> Point {
        self.make_absolute(Point::new(x, y))
    }

    fn control_point(&mut self, x: f64, y: f64) -> Point {
        let point = self.point(x, y);
        self.control = point;
        point
    }

    fn current_point(&mut self, x: f64, y: f64) -> Point {
        let point = self.point(x, y);
        self.current = point;
        point
    }

    /// Mirror of the last control point, when the previous segment belongs
    /// to the same curve family; otherwise the current point.
    fn reflected_control_point(&self, quadratic: bool) -> Point {
        let compatible = self.previous_command.is_some_and(|previous| {
            if quadratic {
                previous.is_quadratic()
            } else {
                previous.is_cubic()
            }
        });
        if !compatible {
            return self.current;
        }
        Point::new(
            2.0 * self.current.x - self.control.x,
            2.0 * self.current.y - self.control.y,
        )
    }

    /// Records a marker vertex. `prior_to` back-fills the previous vertex's
    /// angle when it has none yet.
    pub fn add_marker(&mut self, point: Point, from: Option<Point>, prior_to: Option<Point>) {
        if let Some(prior_to) = prior_to {
            if let (Some(last_angle), Some(last_point)) = (self.angles.last_mut(), self.points.last()) {
                if last_angle.is_none() {
                    *last_angle = Some(last_point.angle_to(&prior_to));
                }
            }
        }
        self.add_marker_angle(point, from.map(|from| from.angle_to(&point)));
    }

    pub fn add_marker_angle(&mut self, point: Point, angle: Option<f64>) {
        self.points.push(point);
        self.angles.push(angle);
    }

    pub fn marker_points(&self) -> &[Point] {
        &self.points
    }

    /// Marker angles with gaps filled from the next known angle.
    pub fn marker_angles(&self) -> Vec<Option<f64>> {
        let mut angles = self.angles.clone();
        for i in 0..angles.len() {
            if angles[i].is_none() {
                angles[i] = angles[i + 1..].iter().find_map(|angle| *angle);
            }
        }
        angles
    }

    pub fn move_to(&mut self) -> Point {
        let point = match self.command {
            Some(PathCommand::MoveTo { x, y, .. }) => self.current_point(x, y),
            _ => self.current,
        };
        self.start = point;
        point
    }

    /// Returns `(from, to)`.
    pub fn line_to(&mut self) -> (Point, Point) {
        let from = self.current;
        let to = match self.command {
            Some(PathCommand::LineTo { x, y, .. }) => self.current_point(x, y),
            _ => from,
        };
        (from, to)
    }

    pub fn horiz_line_to(&mut self) -> (Point, Point) {
        let from = self.current;
        if let Some(PathCommand::HorizLineTo { relative, x }) = self.command {
            self.current = Point::new(if relative { from.x } else { 0.0 } + x, from.y);
        }
        (from, self.current)
    }

    pub fn vert_line_to(&mut self) -> (Point, Point) {
        let from = self.current;
        if let Some(PathCommand::VertLineTo { relative, y }) = self.command {
            self.current = Point::new(from.x, if relative { from.y } else { 0.0 } + y);
        }
        (from, self.current)
    }

    pub fn curve_to(&mut self) -> CubicStep {
        let start = self.current;
        let (control1, x2, y2, x, y) = match self.command {
            Some(PathCommand::CurveTo { x1, y1, x2, y2, x, y, .. }) => (self.point(x1, y1), x2, y2, x, y),
            Some(PathCommand::SmoothCurveTo { x2, y2, x, y, .. }) => {
                (self.reflected_control_point(false), x2, y2, x, y)
            }
            _ => return CubicStep { start, control1: start, control2: start, end: start },
        };
        let control2 = self.control_point(x2, y2);
        let end = self.current_point(x, y);
        CubicStep { start, control1, control2, end }
    }

    pub fn quad_to(&mut self) -> QuadStep {
        let start = self.current;
        match self.command {
            Some(PathCommand::QuadTo { x1, y1, x, y, .. }) => {
                let control = self.control_point(x1, y1);
                let end = self.current_point(x, y);
                QuadStep { start, control, end }
            }
            Some(PathCommand::SmoothQuadTo { x, y, .. }) => {
                let control = self.reflected_control_point(true);
                self.control = control;
                let end = self.current_point(x, y);
                QuadStep { start, control, end }
            }
            _ => QuadStep { start, control: start, end: start },
        }
    }

    /// Converts the current arc from endpoint to center parameterization,
    /// scaling radii up when they cannot span the endpoints.
    pub fn arc(&mut self) -> ArcStep {
        let start = self.current;
        let Some(PathCommand::Arc {
            rx,
            ry,
            x_axis_rotation,
            large_arc,
            sweep,
            x,
            y,
            ..
        }) = self.command
        else {
            return ArcStep {
                start,
                end: start,
                rx: 0.0,
                ry: 0.0,
                sweep: false,
                x_axis_rotation: 0.0,
                center: start,
                start_angle: 0.0,
                delta: 0.0,
                is_line: true,
            };
        };
        let end = self.current_point(x, y);
        let mut rx = rx.abs();
        let mut ry = ry.abs();
        let rotation = x_axis_rotation * (PI / 180.0);

        if rx == 0.0 || ry == 0.0 {
            return ArcStep {
                start,
                end,
                rx,
                ry,
                sweep,
                x_axis_rotation: rotation,
                center: end,
                start_angle: 0.0,
                delta: 0.0,
                is_line: true,
            };
        }

        let (sin, cos) = rotation.sin_cos();
        let half_dx = (start.x - end.x) / 2.0;
        let half_dy = (start.y - end.y) / 2.0;
        let currp = Point::new(cos * half_dx + sin * half_dy, -sin * half_dx + cos * half_dy);

        let l = currp.x.powi(2) / rx.powi(2) + currp.y.powi(2) / ry.powi(2);
        if l > 1.0 {
            rx *= l.sqrt();
            ry *= l.sqrt();
        }

        let numerator = rx.powi(2) * ry.powi(2) - rx.powi(2) * currp.y.powi(2) - ry.powi(2) * currp.x.powi(2);
        let denominator = rx.powi(2) * currp.y.powi(2) + ry.powi(2) * currp.x.powi(2);
        let sign = if large_arc == sweep { -1.0 } else { 1.0 };
        let mut s = sign * (numerator / denominator).sqrt();
        if s.is_nan() {
            s = 0.0;
        }
        let cpp = Point::new(s * rx * currp.y / ry, s * -ry * currp.x / rx);
        let center = Point::new(
            (start.x + end.x) / 2.0 + cos * cpp.x - sin * cpp.y,
            (start.y + end.y) / 2.0 + sin * cpp.x + cos * cpp.y,
        );

        let u = [(currp.x - cpp.x) / rx, (currp.y - cpp.y) / ry];
        let v = [(-currp.x - cpp.x) / rx, (-currp.y - cpp.y) / ry];
        let start_angle = vectors_angle([1.0, 0.0], u);
        let mut delta = vectors_angle(u, v);
        let ratio = vectors_ratio(u, v);
        if ratio <= -1.0 {
            delta = PI;
        }
        if ratio >= 1.0 {
            delta = 0.0;
        }

        ArcStep {
            start,
            end,
            rx,
            ry,
            sweep,
            x_axis_rotation: rotation,
            center,
            start_angle,
            delta,
            is_line: false,
        }
    }

    pub fn close_path(&mut self) {
        self.current = self.start;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk_to_end(commands: &[PathCommand]) -> Point {
        let mut parser = PathParser::new(commands);
        while !parser.is_end() {
            match parser.next() {
                Some(PathCommand::MoveTo { .. }) => {
                    parser.move_to();
                }
                Some(PathCommand::LineTo { .. }) => {
                    parser.line_to();
                }
                Some(PathCommand::HorizLineTo { .. }) => {
                    parser.horiz_line_to();
                }
                Some(PathCommand::VertLineTo { .. }) => {
                    parser.vert_line_to();
                }
                Some(PathCommand::CurveTo { .. } | PathCommand::SmoothCurveTo { .. }) => {
                    parser.curve_to();
                }
                Some(PathCommand::QuadTo { .. } | PathCommand::SmoothQuadTo { .. }) => {
                    parser.quad_to();
                }
                Some(PathCommand::Arc { .. }) => {
                    parser.arc();
                }
                Some(PathCommand::ClosePath) => parser.close_path(),
                None => break,
            }
        }
        parser.current
    }

    #[test]
    fn test_implicit_lineto_after_moveto() {
        let commands = parse_path_data("M10 10 20 20 30 10");
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[1], PathCommand::LineTo { relative: false, x, y } if x == 20.0 && y == 20.0));
        let relative = parse_path_data("m1 1 2 2");
        assert!(matches!(relative[1], PathCommand::LineTo { relative: true, .. }));
    }

    #[test]
    fn test_compact_numbers_and_arc_flags() {
        let commands = parse_path_data("M.5-.5l1e1.5a5 5 0 1010 0");
        assert_eq!(
            commands[0],
            PathCommand::MoveTo { relative: false, x: 0.5, y: -0.5 }
        );
        assert_eq!(
            commands[1],
            PathCommand::LineTo { relative: true, x: 10.0, y: 0.5 }
        );
        assert!(matches!(
            commands[2],
            PathCommand::Arc { large_arc: true, sweep: false, x, .. } if x == 10.0
        ));
    }

    #[test]
    fn test_stops_at_malformed_segment() {
        let commands = parse_path_data("M0 0 L10 10 L 5 Q");
        assert_eq!(commands.len(), 2);
    }

    #[test]
    fn test_serialized_path_reaches_same_point() {
        let data = "M10 20 l30 0 h-5 v 15 c 5 5 10 5 15 0 s 10 -10 20 0 q 5 5 10 0 t 10 0 a 10 5 30 0 1 20 0 z m 5 5 l 1 1";
        let commands = parse_path_data(data);
        let reparsed = parse_path_data(&to_path_data(&commands));
        assert_eq!(commands, reparsed);
        assert_eq!(walk_to_end(&commands), walk_to_end(&reparsed));
        assert_eq!(walk_to_end(&commands), Point::new(16.0, 26.0));
    }

    #[test]
    fn test_reflection_requires_same_family() {
        let commands = parse_path_data("M0 0 Q 10 10 20 0 S 30 10 40 0");
        let mut parser = PathParser::new(&commands);
        parser.next();
        parser.move_to();
        parser.next();
        parser.quad_to();
        parser.next();
        let step = parser.curve_to();
        // A quadratic control point is not reflected into a cubic.
        assert_eq!(step.control1, Point::new(20.0, 0.0));

        let commands = parse_path_data("M0 0 C 0 10 10 10 20 0 S 30 10 40 0");
        let mut parser = PathParser::new(&commands);
        parser.next();
        parser.move_to();
        parser.next();
        parser.curve_to();
        parser.next();
        let step = parser.curve_to();
        assert_eq!(step.control1, Point::new(30.0, -10.0));
    }

    #[test]
    fn test_semicircle_arc_center() {
        let commands = parse_path_data("M0 0 A 10 10 0 0 1 20 0");
        let mut parser = PathParser::new(&commands);
        parser.next();
        parser.move_to();
        parser.next();
        let step = parser.arc();
        assert!((step.center.x - 10.0).abs() < 1e-9);
        assert!(step.center.y.abs() < 1e-9);
        assert!((step.delta.abs() - PI).abs() < 1e-9);
        assert!(!step.is_line);
    }

    #[test]
    fn test_marker_angles_backfill() {
        let commands: Vec<PathCommand> = Vec::new();
        let mut parser = PathParser::new(&commands);
        parser.add_marker(Point::new(0.0, 0.0), None, None);
        parser.add_marker(Point::new(10.0, 0.0), Some(Point::new(0.0, 0.0)), None);
        parser.add_marker(Point::new(10.0, 10.0), Some(Point::new(10.0, 0.0)), None);
        let angles = parser.marker_angles();
        assert_eq!(angles[0], Some(0.0));
        assert_eq!(angles[2], Some(PI / 2.0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn coordinate() -> impl Strategy<Value = f64> {
            -500.0..500.0f64
        }

        fn drawing_command() -> impl Strategy<Value = PathCommand> {
            let c = coordinate;
            prop_oneof![
                (any::<bool>(), c(), c()).prop_map(|(relative, x, y)| PathCommand::MoveTo { relative, x, y }),
                (any::<bool>(), c(), c()).prop_map(|(relative, x, y)| PathCommand::LineTo { relative, x, y }),
                (any::<bool>(), c()).prop_map(|(relative, x)| PathCommand::HorizLineTo { relative, x }),
                (any::<bool>(), c()).prop_map(|(relative, y)| PathCommand::VertLineTo { relative, y }),
                (any::<bool>(), [c(), c(), c(), c(), c(), c()]).prop_map(|(relative, [x1, y1, x2, y2, x, y])| {
                    PathCommand::CurveTo { relative, x1, y1, x2, y2, x, y }
                }),
                (any::<bool>(), [c(), c(), c(), c()])
                    .prop_map(|(relative, [x2, y2, x, y])| PathCommand::SmoothCurveTo { relative, x2, y2, x, y }),
                (any::<bool>(), [c(), c(), c(), c()])
                    .prop_map(|(relative, [x1, y1, x, y])| PathCommand::QuadTo { relative, x1, y1, x, y }),
                (any::<bool>(), c(), c()).prop_map(|(relative, x, y)| PathCommand::SmoothQuadTo { relative, x, y }),
                (
                    any::<bool>(),
                    (0.0..200.0f64, 0.0..200.0f64, -360.0..360.0f64),
                    (any::<bool>(), any::<bool>()),
                    (c(), c()),
                )
                    .prop_map(|(relative, (rx, ry, x_axis_rotation), (large_arc, sweep), (x, y))| {
                        PathCommand::Arc { relative, rx, ry, x_axis_rotation, large_arc, sweep, x, y }
                    }),
                Just(PathCommand::ClosePath),
            ]
        }

        fn path() -> impl Strategy<Value = Vec<PathCommand>> {
            (any::<bool>(), coordinate(), coordinate(), prop::collection::vec(drawing_command(), 0..16))
                .prop_map(|(relative, x, y, rest)| {
                    let mut commands = vec![PathCommand::MoveTo { relative, x, y }];
                    commands.extend(rest);
                    commands
                })
        }

        /// End point folded straight from the command list.
        fn expected_end(commands: &[PathCommand]) -> Point {
            let mut current = Point::default();
            let mut start = Point::default();
            for command in commands {
                let origin = if command.is_relative() { current } else { Point::default() };
                let to = |x: f64, y: f64| Point::new(origin.x + x, origin.y + y);
                current = match *command {
                    PathCommand::MoveTo { x, y, .. } => {
                        start = to(x, y);
                        start
                    }
                    PathCommand::LineTo { x, y, .. }
                    | PathCommand::CurveTo { x, y, .. }
                    | PathCommand::SmoothCurveTo { x, y, .. }
                    | PathCommand::QuadTo { x, y, .. }
                    | PathCommand::SmoothQuadTo { x, y, .. }
                    | PathCommand::Arc { x, y, .. } => to(x, y),
                    PathCommand::HorizLineTo { x, .. } => Point::new(origin.x + x, current.y),
                    PathCommand::VertLineTo { y, .. } => Point::new(current.x, origin.y + y),
                    PathCommand::ClosePath => start,
                };
            }
            current
        }

        proptest! {
            #[test]
            fn test_serialized_random_path_reaches_same_point(commands in path()) {
                let data = to_path_data(&commands);
                let reparsed = parse_path_data(&data);
                prop_assert_eq!(&reparsed, &commands, "{}", data);

                let end = walk_to_end(&reparsed);
                let expected = expected_end(&commands);
                prop_assert!(
                    (end.x - expected.x).abs() < 1e-9 && (end.y - expected.y).abs() < 1e-9,
                    "{} ended at {:?}, expected {:?}",
                    data,
                    end,
                    expected
                );
            }
        }
    }
}
