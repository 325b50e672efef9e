//! Renders SVG documents through canvg-rs into the raster canvas and probes
//! the resulting pixels.

use canvg_canvas2d::{Canvas2dContext, FontConfig};
use canvg_rs::{Canvg, CanvgOptions};
use std::io::Write;

const SVG_NS: &str = "xmlns='http://www.w3.org/2000/svg'";

fn render(body: &str, width: u32, height: u32) -> Canvas2dContext {
    let ctx = Canvas2dContext::builder(width, height)
        .font_config(FontConfig::empty())
        .build()
        .unwrap();
    let svg = format!("<svg {SVG_NS} width='{width}' height='{height}'>{body}</svg>");
    let mut canvg = Canvg::from_string(ctx, &svg, CanvgOptions::default()).unwrap();
    canvg.render();
    canvg.into_context()
}

fn pixel(ctx: &Canvas2dContext, x: i32, y: i32) -> [u8; 4] {
    ctx.get_image_data(x, y, 1, 1).pixel(0, 0)
}

#[test]
fn test_rect_fill() {
    let ctx = render("<rect x='10' y='10' width='30' height='20' fill='red'/>", 50, 50);
    assert_eq!(pixel(&ctx, 20, 20), [255, 0, 0, 255]);
    assert_eq!(pixel(&ctx, 5, 5), [0, 0, 0, 0]);
    assert_eq!(pixel(&ctx, 45, 20), [0, 0, 0, 0]);
}

#[test]
fn test_stroke_width_and_color() {
    let ctx = render(
        "<line x1='0' y1='25' x2='50' y2='25' stroke='#00ff00' stroke-width='6'/>",
        50,
        50,
    );
    assert_eq!(pixel(&ctx, 25, 23), [0, 255, 0, 255]);
    assert_eq!(pixel(&ctx, 25, 30)[3], 0);
}

#[test]
fn test_view_box_meet_centres_content() {
    let ctx = render(
        "<svg width='200' height='100' viewBox='0 0 10 10'>\
           <rect width='10' height='10' fill='blue'/></svg>",
        200,
        100,
    );
    assert_eq!(pixel(&ctx, 20, 50)[3], 0);
    assert_eq!(pixel(&ctx, 100, 50), [0, 0, 255, 255]);
    assert_eq!(pixel(&ctx, 180, 50)[3], 0);
}

#[test]
fn test_clip_path_limits_painting() {
    let ctx = render(
        "<clipPath id='c'><circle cx='50' cy='50' r='20'/></clipPath>\
         <rect width='100' height='100' fill='red' clip-path='url(#c)'/>",
        100,
        100,
    );
    assert_eq!(pixel(&ctx, 50, 50), [255, 0, 0, 255]);
    assert_eq!(pixel(&ctx, 10, 10)[3], 0);
    assert_eq!(pixel(&ctx, 50, 80)[3], 0);
}

#[test]
fn test_linear_gradient_fill() {
    let ctx = render(
        "<linearGradient id='g'>\
           <stop offset='0' stop-color='red'/><stop offset='1' stop-color='blue'/>\
         </linearGradient>\
         <rect width='100' height='10' fill='url(#g)'/>",
        100,
        10,
    );
    let left = pixel(&ctx, 1, 5);
    let right = pixel(&ctx, 98, 5);
    assert!(left[0] > 240 && left[2] < 15, "{left:?}");
    assert!(right[2] > 240 && right[0] < 15, "{right:?}");
}

#[test]
fn test_group_opacity() {
    let ctx = render(
        "<g opacity='0.5'><rect width='10' height='10' fill='black'/></g>",
        10,
        10,
    );
    let [_, _, _, a] = pixel(&ctx, 5, 5);
    assert!((a as i32 - 128).abs() <= 1, "alpha {a}");
}

#[test]
fn test_mask_hides_outside_luminance() {
    let ctx = render(
        "<mask id='m'><rect width='50' height='100' fill='white'/></mask>\
         <rect width='100' height='100' fill='red' mask='url(#m)'/>",
        100,
        100,
    );
    let inside = pixel(&ctx, 25, 50);
    assert!(inside[0] > 250 && inside[3] > 250, "{inside:?}");
    assert_eq!(pixel(&ctx, 75, 50)[3], 0);
}

#[test]
fn test_png_output_decodes() {
    let ctx = render("<rect width='8' height='4' fill='#336699'/>", 8, 8);
    let png = ctx.to_png(Some(144.0)).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&png)
        .unwrap();

    let decoded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (8, 8));
    assert_eq!(decoded.get_pixel(2, 2).0, [0x33, 0x66, 0x99, 255]);
    assert_eq!(decoded.get_pixel(2, 6).0, [0, 0, 0, 0]);
}
