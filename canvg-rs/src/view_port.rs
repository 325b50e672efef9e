//! The stack of nested viewport sizes percentages resolve against.

use crate::property::Axis;

pub const DEFAULT_VIEWPORT_WIDTH: f64 = 800.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ViewPort {
    view_ports: Vec<Size>,
}

impl ViewPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.view_ports.clear();
    }

    pub fn set_current(&mut self, width: f64, height: f64) {
        self.view_ports.push(Size { width, height });
    }

    pub fn remove_current(&mut self) {
        self.view_ports.pop();
    }

    pub fn depth(&self) -> usize {
        self.view_ports.len()
    }

    /// The innermost viewport, or the 800x600 default when none is pushed.
    pub fn current(&self) -> Size {
        self.view_ports.last().copied().unwrap_or(Size {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        })
    }

    /// The outermost viewport.
    pub fn root(&self) -> Size {
        self.view_ports.first().copied().unwrap_or(Size {
            width: DEFAULT_VIEWPORT_WIDTH,
            height: DEFAULT_VIEWPORT_HEIGHT,
        })
    }

    pub fn width(&self) -> f64 {
        self.current().width
    }

    pub fn height(&self) -> f64 {
        self.current().height
    }

    pub fn compute_size(&self, axis: Axis) -> f64 {
        let Size { width, height } = self.current();
        match axis {
            Axis::X => width,
            Axis::Y => height,
            Axis::Diagonal => (width.powi(2) + height.powi(2)).sqrt() / std::f64::consts::SQRT_2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_and_default() {
        let mut view_port = ViewPort::new();
        assert_eq!(view_port.width(), 800.0);
        view_port.set_current(100.0, 50.0);
        view_port.set_current(10.0, 20.0);
        assert_eq!(view_port.compute_size(Axis::Y), 20.0);
        assert_eq!(view_port.root().width, 100.0);
        view_port.remove_current();
        assert_eq!(view_port.compute_size(Axis::X), 100.0);
    }

    #[test]
    fn test_diagonal() {
        let mut view_port = ViewPort::new();
        view_port.set_current(3.0, 4.0);
        assert!((view_port.compute_size(Axis::Diagonal) - 5.0 / 2f64.sqrt()).abs() < 1e-12);
    }
}
