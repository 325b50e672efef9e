// Allow deprecated APIs (assert_cmd::cargo_bin is deprecated but still works)
#![allow(deprecated)]

use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const SQUARE_SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>\
    <rect x='0' y='0' width='10' height='20' fill='#ff0000'/></svg>";

const ANIMATED_SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='20' height='20'>\
    <rect width='10' height='10' fill='blue'>\
      <animate attributeName='x' from='0' to='10' dur='1s' fill='freeze'/>\
    </rect></svg>";

fn write_input(dir: &TempDir, name: &str, svg: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, svg).unwrap();
    path
}

fn load_png(path: &Path) -> image::RgbaImage {
    image::open(path).unwrap().to_rgba8()
}

#[test]
fn test_render_writes_png() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_input(&dir, "square.svg", SQUARE_SVG);
    let output = dir.path().join("square.png");

    Command::cargo_bin("canvg")?
        .arg("render")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let png = load_png(&output);
    assert_eq!(png.dimensions(), (20, 20));
    assert_eq!(png.get_pixel(5, 10).0, [255, 0, 0, 255]);
    assert_eq!(png.get_pixel(15, 10).0[3], 0);
    Ok(())
}

#[test]
fn test_render_with_background_and_scale() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_input(&dir, "square.svg", SQUARE_SVG);
    let output = dir.path().join("scaled.png");

    Command::cargo_bin("canvg")?
        .arg("render")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--scale")
        .arg("2")
        .arg("--background")
        .arg("#abc")
        .assert()
        .success();

    let png = load_png(&output);
    assert_eq!(png.dimensions(), (40, 40));
    assert_eq!(png.get_pixel(10, 20).0, [255, 0, 0, 255]);
    assert_eq!(png.get_pixel(30, 20).0, [0xaa, 0xbb, 0xcc, 255]);
    Ok(())
}

#[test]
fn test_render_fits_into_requested_size() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_input(&dir, "square.svg", SQUARE_SVG);
    let output = dir.path().join("fitted.png");

    Command::cargo_bin("canvg")?
        .arg("render")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--width")
        .arg("60")
        .arg("--height")
        .arg("60")
        .assert()
        .success();

    let png = load_png(&output);
    assert_eq!(png.dimensions(), (60, 60));
    assert_eq!(png.get_pixel(20, 30).0, [255, 0, 0, 255]);
    assert_eq!(png.get_pixel(45, 30).0[3], 0);
    Ok(())
}

#[test]
fn test_render_invalid_background() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_input(&dir, "square.svg", SQUARE_SVG);

    Command::cargo_bin("canvg")?
        .arg("render")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out.png"))
        .arg("--background")
        .arg("not-a-color")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid background color"));
    Ok(())
}

#[test]
fn test_render_missing_input() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    Command::cargo_bin("canvg")?
        .arg("render")
        .arg("-i")
        .arg(dir.path().join("missing.svg"))
        .arg("-o")
        .arg(dir.path().join("out.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load input file"));
    Ok(())
}

#[test]
fn test_height_requires_width() -> Result<(), Box<dyn std::error::Error>> {
    Command::cargo_bin("canvg")?
        .arg("render")
        .arg("-i")
        .arg("in.svg")
        .arg("-o")
        .arg("out.png")
        .arg("--height")
        .arg("10")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--width"));
    Ok(())
}

#[test]
fn test_frames_writes_sequence() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_input(&dir, "animated.svg", ANIMATED_SVG);
    let frames_dir = dir.path().join("frames");

    Command::cargo_bin("canvg")?
        .arg("frames")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&frames_dir)
        .arg("--count")
        .arg("3")
        .assert()
        .success();

    for index in 0..3 {
        let frame = frames_dir.join(format!("frame-{index:04}.png"));
        assert_eq!(load_png(&frame).dimensions(), (20, 20));
    }
    assert!(!frames_dir.join("frame-0003.png").exists());
    Ok(())
}

#[test]
fn test_trace_prints_draw_calls() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let input = write_input(&dir, "square.svg", SQUARE_SVG);

    Command::cargo_bin("canvg")?
        .arg("trace")
        .arg("-i")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Fill(").and(predicate::str::contains("Save")));
    Ok(())
}
