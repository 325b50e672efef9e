//! SMIL `<animate>`, `<animateColor>` and `<animateTransform>`.
//!
//! Each animation writes an interpolated value into one attribute or style
//! of its target (the `href` target, else the parent) as the frame loop
//! advances its clock.

use super::{ElementKind, ElementRef};
use crate::color::Color;
use crate::property::{Property, Value};
use crate::util::to_numbers;
use std::cell::{Cell, RefCell};

/// Timing and keyframes parsed when the document is built; the clock and
/// the captured initial value change as the animation runs.
#[derive(Debug, Default)]
pub struct AnimateState {
    /// Milliseconds.
    begin: f64,
    max_duration: f64,
    from: String,
    to: String,
    values: Vec<String>,
    repeats_indefinitely: bool,
    fill: String,
    elapsed: Cell<f64>,
    initial: RefCell<Option<(String, String)>>,
    frozen: Cell<bool>,
    removed: Cell<bool>,
}

impl AnimateState {
    pub(crate) fn from_element(element: ElementRef<'_>) -> Self {
        let begin = element.get_attribute("begin").get_milliseconds();
        let values = element.get_attribute("values");
        Self {
            begin,
            max_duration: begin + element.get_attribute("dur").get_milliseconds(),
            from: element.get_attribute("from").get_string(),
            to: element.get_attribute("to").get_string(),
            values: if values.has_value() {
                values
                    .get_string()
                    .split(';')
                    .map(|value| value.trim().to_string())
                    .collect()
            } else {
                Vec::new()
            },
            repeats_indefinitely: element.get_attribute("repeatCount").get_string() == "indefinite"
                || element.get_attribute("repeatDur").get_string() == "indefinite",
            fill: element.get_attribute("fill").get_string_or("remove"),
            ..Default::default()
        }
    }

    /// Interpolation progress in `[0, 1]` and the keyframes it lies between.
    fn progress(&self) -> (f64, &str, &str) {
        let span = self.max_duration - self.begin;
        let percent = if span > 0.0 {
            ((self.elapsed.get() - self.begin) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if self.values.is_empty() {
            return (percent, &self.from, &self.to);
        }
        let position = percent * (self.values.len() - 1) as f64;
        let lower = position.floor() as usize;
        let upper = position.ceil() as usize;
        let fraction = if upper > lower {
            (position - lower as f64) / (upper - lower) as f64
        } else {
            0.0
        };
        (fraction, &self.values[lower], &self.values[upper])
    }
}

fn state<'d>(animation: ElementRef<'d>) -> Option<&'d AnimateState> {
    match &animation.node().data {
        super::ElementData::Animate(state) => Some(state),
        _ => None,
    }
}

/// The element whose property the animation drives.
pub(crate) fn target<'d>(animation: ElementRef<'d>) -> Option<ElementRef<'d>> {
    let href = animation.get_href_attribute();
    if href.has_value() {
        return href.get_definition();
    }
    animation.parent()
}

fn animated_property<'d>(animation: ElementRef<'d>, target: ElementRef<'d>) -> Property<'d> {
    let name = animation.get_attribute("attributeName").get_string();
    if animation.get_attribute("attributeType").get_string() == "CSS" {
        target.get_style_with(&name, true, true)
    } else {
        target.ensure_attribute(&name)
    }
}

/// Advances the animation clock by `delta` milliseconds. Returns whether
/// the target changed and the document needs a redraw.
pub(crate) fn update(animation: ElementRef<'_>, delta: f64) -> bool {
    let (Some(state), Some(target)) = (state(animation), target(animation)) else {
        return false;
    };
    let mut property = animated_property(animation, target);
    {
        let mut initial = state.initial.borrow_mut();
        if initial.is_none() {
            *initial = Some((property.get_string(), property.get_units()));
        }
    }

    if state.elapsed.get() > state.max_duration {
        if state.repeats_indefinitely {
            state.elapsed.set(0.0);
        } else if state.fill == "freeze" && !state.frozen.get() {
            state.frozen.set(true);
            let node = target.node();
            node.animation_frozen.set(true);
            *node.animation_frozen_value.borrow_mut() = Some(property.get_string());
        } else if state.fill == "remove" && !state.removed.get() {
            state.removed.set(true);
            let node = target.node();
            let restored = if node.animation_frozen.get() {
                node.animation_frozen_value.borrow().clone()
            } else {
                state.initial.borrow().as_ref().map(|(value, _)| value.clone())
            };
            property.set_value(Value::from(restored));
            return true;
        }
        return false;
    }

    state.elapsed.set(state.elapsed.get() + delta);
    if state.begin >= state.elapsed.get() {
        return false;
    }

    let mut value = calculate_value(animation, state);
    let kind = animation.get_attribute("type");
    if kind.has_value() {
        value = format!("{}({value})", kind.get_string());
    }
    log::trace!(
        target: "canvg::screen",
        "<{}> sets {} = {value}",
        animation.tag(),
        property.name()
    );
    property.set_value(value);
    true
}

fn calculate_value(animation: ElementRef<'_>, state: &AnimateState) -> String {
    let (percent, from, to) = state.progress();
    match animation.kind() {
        ElementKind::AnimateColor => match (Color::parse(from), Color::parse(to)) {
            (Some(from), Some(to)) => {
                let mix = |a: u8, b: u8| {
                    (f64::from(a) + (f64::from(b) - f64::from(a)) * percent).floor()
                };
                format!(
                    "rgb({}, {}, {})",
                    mix(from.r, to.r),
                    mix(from.g, to.g),
                    mix(from.b, to.b)
                )
            }
            _ => animation.get_attribute("from").get_color(),
        },
        ElementKind::AnimateTransform => {
            let from = to_numbers(from);
            let to = to_numbers(to);
            from.iter()
                .enumerate()
                .map(|(i, from)| {
                    let to = to.get(i).copied().unwrap_or(*from);
                    crate::property::format_number(from + (to - from) * percent)
                })
                .collect::<Vec<_>>()
                .join(" ")
        }
        _ => {
            let document = animation.document();
            let from = Property::new(document, "from", from).get_number();
            let to = Property::new(document, "to", to).get_number();
            let units = state
                .initial
                .borrow()
                .as_ref()
                .map(|(_, units)| units.clone())
                .unwrap_or_default();
            let mut value = from + (to - from) * percent;
            if units == "%" {
                value *= 100.0;
            }
            format!("{}{units}", crate::property::format_number(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn run(doc: &Document, steps: usize, delta: f64) -> bool {
        let mut changed = false;
        for _ in 0..steps {
            for animation in doc.animations() {
                changed |= update(animation, delta);
            }
        }
        changed
    }

    #[test]
    fn test_animate_interpolates_attribute() {
        let doc = Document::from_string(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <rect id='r' width='10' height='10'>\
                 <animate attributeName='width' from='10' to='110' dur='1s' fill='freeze'/>\
               </rect></svg>",
        )
        .unwrap();
        let rect = doc.get_element_by_id("r").unwrap();
        assert!(run(&doc, 5, 100.0));
        assert_eq!(rect.get_attribute("width").get_number(), 60.0);
        run(&doc, 10, 100.0);
        assert_eq!(rect.get_attribute("width").get_number(), 110.0);
        assert!(rect.node().animation_frozen.get());
    }

    #[test]
    fn test_remove_restores_initial_value() {
        let doc = Document::from_string(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <rect id='r' width='10' height='10'>\
                 <animate attributeName='width' from='0' to='100' dur='200ms'/>\
               </rect></svg>",
        )
        .unwrap();
        let rect = doc.get_element_by_id("r").unwrap();
        run(&doc, 4, 100.0);
        assert_eq!(rect.get_attribute("width").get_string(), "10");
        assert!(!run(&doc, 3, 100.0));
    }

    #[test]
    fn test_values_list_and_begin_offset() {
        let doc = Document::from_string(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <circle id='c' r='1'>\
                 <animate attributeName='r' values='0;10;30' begin='1s' dur='1s' fill='freeze'/>\
               </circle></svg>",
        )
        .unwrap();
        let circle = doc.get_element_by_id("c").unwrap();
        assert!(!run(&doc, 10, 100.0));
        run(&doc, 5, 100.0);
        assert_eq!(circle.get_attribute("r").get_number(), 10.0);
    }

    #[test]
    fn test_animate_color_and_transform() {
        let doc = Document::from_string(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <rect id='r' width='10' height='10'>\
                 <animateColor attributeName='fill' attributeType='CSS' from='#000000' to='#ff0000' dur='1s'/>\
                 <animateTransform attributeName='transform' type='rotate' from='0 5 5' to='90 5 5' dur='1s'/>\
               </rect></svg>",
        )
        .unwrap();
        let rect = doc.get_element_by_id("r").unwrap();
        run(&doc, 5, 100.0);
        assert_eq!(rect.get_own_style("fill").get_string(), "rgb(127, 0, 0)");
        assert_eq!(rect.get_attribute("transform").get_string(), "rotate(45 5 5)");
    }

    #[test]
    fn test_indefinite_repeat_restarts() {
        let doc = Document::from_string(
            "<svg xmlns='http://www.w3.org/2000/svg'>\
               <rect id='r' width='0' height='10'>\
                 <animate attributeName='height' from='0' to='100' dur='100ms' repeatCount='indefinite'/>\
               </rect></svg>",
        )
        .unwrap();
        let rect = doc.get_element_by_id("r").unwrap();
        run(&doc, 4, 50.0);
        assert_eq!(rect.get_attribute("height").get_number(), 100.0);
        run(&doc, 1, 50.0);
        assert_eq!(rect.get_attribute("height").get_number(), 50.0);
    }
}
