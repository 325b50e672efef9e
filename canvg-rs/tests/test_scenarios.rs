use canvg_rs::color::Color;
use canvg_rs::{
    Canvg, CanvgError, CanvgOptions, Document, DrawCall, ManualScheduler, Paint, RecordingContext,
    RenderingContext,
};
use std::sync::{Arc, Mutex};

const SVG_NS: &str = "xmlns='http://www.w3.org/2000/svg'";

fn render(body: &str, width: u32, height: u32) -> RecordingContext {
    let svg = format!("<svg {SVG_NS} width='{width}' height='{height}'>{body}</svg>");
    let mut canvg =
        Canvg::from_string(RecordingContext::new(width, height), &svg, CanvgOptions::default())
            .unwrap();
    canvg.render();
    canvg.into_context()
}

fn fill_paints(ctx: &RecordingContext) -> Vec<Paint> {
    ctx.calls()
        .iter()
        .filter_map(|call| match call {
            DrawCall::Fill(_, paint) => Some(paint.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_rect_fills_once_with_exact_bounds() {
    let ctx = render(
        "<rect id='r' x='10' y='10' width='100' height='50' fill='red'/>",
        200,
        100,
    );
    assert_eq!(fill_paints(&ctx), vec![Paint::Color(Color::rgb(255, 0, 0))]);
    assert_eq!(ctx.stack_depth(), 0);

    let doc = Document::from_string(&format!(
        "<svg {SVG_NS}><rect id='r' x='10' y='10' width='100' height='50'/></svg>"
    ))
    .unwrap();
    let mut scratch = RecordingContext::new(1, 1);
    let bbox = doc
        .get_element_by_id("r")
        .unwrap()
        .get_bounding_box(&mut scratch)
        .unwrap();
    assert_eq!((bbox.x1, bbox.y1, bbox.x2, bbox.y2), (10.0, 10.0, 110.0, 60.0));
}

#[test]
fn test_zero_radius_circle_draws_nothing() {
    let ctx = render("<circle cx='50' cy='50' r='0'/>", 100, 100);
    assert_eq!(ctx.paint_calls().count(), 0);
}

#[test]
fn test_zero_length_gradient_falls_back_to_last_stop() {
    let ctx = render(
        "<linearGradient id='g' x1='0' y1='0' x2='0' y2='0'>\
           <stop offset='0' stop-color='red'/><stop offset='1' stop-color='blue'/>\
         </linearGradient>\
         <rect width='10' height='10' fill='url(#g)'/>",
        20,
        20,
    );
    assert_eq!(fill_paints(&ctx), vec![Paint::Color(Color::rgb(0, 0, 255))]);
}

#[test]
fn test_missing_paint_reference_keeps_default_fill() {
    let ctx = render(
        "<rect width='10' height='10' fill='url(#missing)'/>",
        20,
        20,
    );
    assert_eq!(fill_paints(&ctx), vec![Paint::Color(Color::BLACK)]);
}

#[test]
fn test_higher_specificity_wins_and_ties_go_to_the_later_rule() {
    let doc = Document::from_string(&format!(
        "<svg {SVG_NS}>\
           <style>rect.a {{ fill: red }} rect {{ fill: blue }} .b {{ stroke: red }} .c {{ stroke: blue }}</style>\
           <rect id='r' class='a b c'/></svg>"
    ))
    .unwrap();
    let rect = doc.get_element_by_id("r").unwrap();
    assert_eq!(rect.get_style("fill").get_string(), "red");
    assert_eq!(rect.get_style("stroke").get_string(), "blue");
}

#[test]
fn test_cubic_bounding_box_is_tight() {
    let d = "M10 10 C 20 80, 80 -40, 90 30";
    let doc = Document::from_string(&format!("<svg {SVG_NS}><path id='p' d='{d}'/></svg>")).unwrap();
    let mut scratch = RecordingContext::new(1, 1);
    let bbox = doc
        .get_element_by_id("p")
        .unwrap()
        .get_bounding_box(&mut scratch)
        .unwrap();

    let (y0, y1, y2, y3) = (10.0, 80.0, -40.0, 30.0);
    let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
    for step in 0..=1000 {
        let t = f64::from(step) / 1000.0;
        let mt = 1.0 - t;
        let y = mt.powi(3) * y0
            + 3.0 * mt.powi(2) * t * y1
            + 3.0 * mt * t.powi(2) * y2
            + t.powi(3) * y3;
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    assert!((bbox.x1 - 10.0).abs() < 1e-6);
    assert!((bbox.x2 - 90.0).abs() < 1e-6);
    assert!((bbox.y1 - min_y).abs() < 1e-3, "{} vs {min_y}", bbox.y1);
    assert!((bbox.y2 - max_y).abs() < 1e-3, "{} vs {max_y}", bbox.y2);
}

#[test]
fn test_relative_and_absolute_path_data_end_at_the_same_point() {
    let last_vertex = |d: &str| {
        let doc =
            Document::from_string(&format!("<svg {SVG_NS}><path id='p' d='{d}'/></svg>")).unwrap();
        let markers = doc.get_element_by_id("p").unwrap().get_markers().unwrap();
        markers.last().map(|(point, _)| *point).unwrap()
    };
    let relative = last_vertex("M 10 10 l 20 0 q 10 10 20 0 t 20 0 s 10 10 20 0 h -5 v 5 a 5 5 0 0 1 10 0 l 4 -3");
    let absolute = last_vertex("M10 10 L30 10 Q40 20 50 10 T70 10 S80 20 90 10 H85 V15 A5 5 0 0 1 95 15 L99 12");
    assert!((relative.x - absolute.x).abs() < 1e-9, "{relative:?} vs {absolute:?}");
    assert!((relative.y - absolute.y).abs() < 1e-9, "{relative:?} vs {absolute:?}");
    assert!((absolute.x - 99.0).abs() < 1e-9 && (absolute.y - 12.0).abs() < 1e-9);
}

#[test]
fn test_nested_view_box_meet_is_centred() {
    let visited = Arc::new(Mutex::new(Vec::new()));
    let sink = visited.clone();
    let svg = format!(
        "<svg {SVG_NS} width='200' height='100'>\
           <svg width='200' height='100' viewBox='0 0 10 10' preserveAspectRatio='xMidYMid meet'>\
             <a href='#hit'><rect width='10' height='10'/></a>\
           </svg></svg>"
    );
    let host = ManualScheduler::new();
    let mut canvg = Canvg::from_string(
        RecordingContext::new(200, 100),
        &svg,
        CanvgOptions {
            enable_redraw: true,
            navigate: Some(Arc::new(move |href: &str| {
                sink.lock().unwrap().push(href.to_string());
            })),
            ..Default::default()
        },
    )
    .unwrap();
    canvg.start(host.clone());

    // The 10x10 box maps to x 50..150 at scale 10.
    canvg.click(20.0, 50.0);
    host.advance(40.0);
    canvg.tick();
    assert!(visited.lock().unwrap().is_empty());

    canvg.click(140.0, 90.0);
    host.advance(40.0);
    canvg.tick();
    assert_eq!(*visited.lock().unwrap(), vec!["#hit".to_string()]);
    canvg.stop();
}

#[test]
fn test_failed_image_still_becomes_ready() {
    let mut canvg = Canvg::from_string(
        RecordingContext::new(50, 50),
        &format!(
            "<svg {SVG_NS} width='50' height='50'>\
               <image width='50' height='50' href='/definitely/missing.png'/>\
               <rect width='5' height='5'/></svg>"
        ),
        CanvgOptions::default(),
    )
    .unwrap();
    canvg.render();
    assert!(canvg.is_ready());
    assert_eq!(canvg.context().paint_calls().count(), 1);
}

#[test]
fn test_malformed_markup_is_a_parse_error() {
    let err = Canvg::from_string(
        RecordingContext::new(10, 10),
        "<svg><g></svg>",
        CanvgOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CanvgError::XmlParse(_)));
    assert!(err.to_string().starts_with("Failed to parse SVG markup"));
}

#[test]
fn test_unknown_elements_and_bad_numbers_degrade() {
    let ctx = render(
        "<frobnicate><rect width='abc' height='10'/><rect width='10' height='10'/></frobnicate>",
        20,
        20,
    );
    assert_eq!(ctx.paint_calls().count(), 1);
    assert!(ctx
        .get_transform()
        .approx_eq(&canvg_rs::geometry::Matrix::identity(), 1e-9));
}

#[test]
fn test_oversized_documents_render_without_aborting() {
    let ctx = render(
        "<pattern id='p' patternUnits='userSpaceOnUse' width='200000' height='200000'>\
           <rect width='10' height='10'/></pattern>\
         <rect width='100' height='100' fill='url(#p)'/>",
        100,
        100,
    );
    assert_eq!(ctx.paint_calls().count(), 1);

    let mut canvg = Canvg::from_string(
        RecordingContext::new(100, 100),
        &format!("<svg {SVG_NS} width='200000' height='200000'><rect width='10' height='10'/></svg>"),
        CanvgOptions::default(),
    )
    .unwrap();
    canvg.render();
    assert_eq!((canvg.context().width(), canvg.context().height()), (100, 100));
    assert_eq!(canvg.context().paint_calls().count(), 1);
}
