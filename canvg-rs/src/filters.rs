//! Pixel operations behind `<filter>` and `<mask>`: gaussian blur and 4x5
//! color matrices over straight-alpha RGBA8 buffers.

use crate::context::ImageData;

/// A 4x5 row-major color matrix. Offsets (the fifth column) are in `[0, 1]`.
pub type ColorMatrixValues = [f64; 20];

pub const IDENTITY_MATRIX: ColorMatrixValues = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

pub const LUMINANCE_TO_ALPHA_MATRIX: ColorMatrixValues = [
    0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 0.0, 0.0, //
    0.2125, 0.7154, 0.0721, 0.0, 0.0,
];

pub fn saturate_matrix(s: f64) -> ColorMatrixValues {
    [
        0.213 + 0.787 * s,
        0.715 - 0.715 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 + 0.285 * s,
        0.072 - 0.072 * s,
        0.0,
        0.0,
        0.213 - 0.213 * s,
        0.715 - 0.715 * s,
        0.072 + 0.928 * s,
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

pub fn hue_rotate_matrix(degrees: f64) -> ColorMatrixValues {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let c = |m1: f64, m2: f64, m3: f64| m1 + cos * m2 + sin * m3;
    [
        c(0.213, 0.787, -0.213),
        c(0.715, -0.715, -0.715),
        c(0.072, -0.072, 0.928),
        0.0,
        0.0,
        c(0.213, -0.213, 0.143),
        c(0.715, 0.285, 0.140),
        c(0.072, -0.072, -0.283),
        0.0,
        0.0,
        c(0.213, -0.213, -0.787),
        c(0.715, -0.715, 0.715),
        c(0.072, 0.928, 0.072),
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        1.0,
        0.0,
    ]
}

/// Builds the matrix for an `feColorMatrix` `type` and its `values`.
pub fn color_matrix_for(kind: &str, values: &[f64]) -> ColorMatrixValues {
    match kind {
        "saturate" => saturate_matrix(values.first().copied().unwrap_or(1.0)),
        "hueRotate" => hue_rotate_matrix(values.first().copied().unwrap_or(0.0)),
        "luminanceToAlpha" => LUMINANCE_TO_ALPHA_MATRIX,
        _ => match <[f64; 20]>::try_from(values) {
            Ok(matrix) => matrix,
            Err(_) => {
                if !values.is_empty() {
                    log::warn!(
                        target: "canvg::filter",
                        "feColorMatrix needs 20 values, got {}",
                        values.len()
                    );
                }
                IDENTITY_MATRIX
            }
        },
    }
}

/// Applies `matrix` to every pixel. With `include_opacity` the color
/// channels are cleared and the result alpha is scaled by the source alpha,
/// which turns luminance into a mask.
pub fn apply_color_matrix(image: &mut ImageData, matrix: &ColorMatrixValues, include_opacity: bool) {
    for pixel in image.data.chunks_exact_mut(4) {
        let [r, g, b, a] = [pixel[0], pixel[1], pixel[2], pixel[3]].map(f64::from);
        let row = |i: usize| {
            matrix[i] * r + matrix[i + 1] * g + matrix[i + 2] * b + matrix[i + 3] * a + matrix[i + 4] * 255.0
        };
        let (mut nr, mut ng, mut nb, mut na) = (row(0), row(5), row(10), row(15));
        if include_opacity {
            nr = 0.0;
            ng = 0.0;
            nb = 0.0;
            na *= a / 255.0;
        }
        pixel[0] = to_channel(nr);
        pixel[1] = to_channel(ng);
        pixel[2] = to_channel(nb);
        pixel[3] = to_channel(na);
    }
}

/// Scales each pixel's alpha by the matching mask pixel's alpha.
pub fn multiply_alpha(image: &mut ImageData, mask: &ImageData) {
    for (y, row) in image.data.chunks_exact_mut(image.width as usize * 4).enumerate() {
        for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
            let [_, _, _, mask_alpha] = mask.pixel(x as u32, y as u32);
            pixel[3] = ((u32::from(pixel[3]) * u32::from(mask_alpha) + 127) / 255) as u8;
        }
    }
}

fn to_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Normalized gaussian weights in Q16 fixed point, summing to exactly 1.
pub fn gaussian_kernel_q16(radius: u32, sigma: f64) -> Vec<u32> {
    if radius == 0 || !sigma.is_finite() || sigma <= 0.0 {
        return vec![1 << 16];
    }
    let r = radius as i32;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-r..=r)
        .map(|i| (-(f64::from(i) * f64::from(i)) / denom).exp())
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut kernel: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let total: i64 = kernel.iter().map(|&w| i64::from(w)).sum();
    let mid = kernel.len() / 2;
    kernel[mid] = (i64::from(kernel[mid]) + 65536 - total).clamp(0, 65536) as u32;
    kernel
}

/// Separable gaussian blur with a `ceil(3σ)` radius. Blurs premultiplied
/// values so transparent pixels do not bleed color.
pub fn gaussian_blur(image: &mut ImageData, std_deviation: f64) {
    let (width, height) = (image.width as usize, image.height as usize);
    if width == 0 || height == 0 || std_deviation <= 0.0 {
        return;
    }
    let radius = (std_deviation * 3.0).ceil() as u32;
    let kernel = gaussian_kernel_q16(radius, std_deviation);
    if kernel.len() == 1 {
        return;
    }

    let mut premultiplied: Vec<u8> = image.data.clone();
    for pixel in premultiplied.chunks_exact_mut(4) {
        let alpha = u32::from(pixel[3]);
        for channel in &mut pixel[..3] {
            *channel = ((u32::from(*channel) * alpha + 127) / 255) as u8;
        }
    }

    let mut tmp = vec![0u8; premultiplied.len()];
    blur_pass(&premultiplied, &mut tmp, width, height, &kernel, true);
    blur_pass(&tmp, &mut premultiplied, width, height, &kernel, false);

    for (out, pixel) in image.data.chunks_exact_mut(4).zip(premultiplied.chunks_exact(4)) {
        let alpha = u32::from(pixel[3]);
        out[3] = pixel[3];
        for c in 0..3 {
            out[c] = if alpha == 0 {
                0
            } else {
                ((u32::from(pixel[c]) * 255 + alpha / 2) / alpha).min(255) as u8
            };
        }
    }
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: usize, height: usize, kernel: &[u32], horizontal: bool) {
    let radius = (kernel.len() / 2) as isize;
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0u64; 4];
            for (k, &weight) in kernel.iter().enumerate() {
                let offset = k as isize - radius;
                let (sx, sy) = if horizontal {
                    ((x as isize + offset).clamp(0, width as isize - 1) as usize, y)
                } else {
                    (x, (y as isize + offset).clamp(0, height as isize - 1) as usize)
                };
                let idx = (sy * width + sx) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(weight) * u64::from(src[idx + c]);
                }
            }
            let out = (y * width + x) * 4;
            for c in 0..4 {
                dst[out + c] = ((acc[c] + (1 << 15)) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> ImageData {
        let mut image = ImageData::new(width, height);
        for pixel in image.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
        image
    }

    #[test]
    fn test_kernel_sums_to_one() {
        let kernel = gaussian_kernel_q16(6, 2.0);
        assert_eq!(kernel.len(), 13);
        assert_eq!(kernel.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
        assert!(kernel[6] > kernel[0]);
    }

    #[test]
    fn test_blur_keeps_uniform_image() {
        let mut image = solid(8, 8, [10, 200, 30, 255]);
        gaussian_blur(&mut image, 2.0);
        assert_eq!(image.pixel(4, 4), [10, 200, 30, 255]);
    }

    #[test]
    fn test_blur_spreads_a_single_pixel() {
        let mut image = ImageData::new(9, 9);
        let center = (4 * 9 + 4) * 4;
        image.data[center..center + 4].copy_from_slice(&[255, 0, 0, 255]);
        gaussian_blur(&mut image, 1.0);
        let [r, _, _, a] = image.pixel(5, 4);
        assert!(a > 0 && a < 255);
        assert_eq!(r, 255);
        assert!(image.pixel(4, 4)[3] < 255);
    }

    #[test]
    fn test_luminance_to_alpha_with_opacity() {
        let mut image = solid(1, 1, [255, 255, 255, 128]);
        apply_color_matrix(&mut image, &LUMINANCE_TO_ALPHA_MATRIX, true);
        let [r, g, b, a] = image.pixel(0, 0);
        assert_eq!((r, g, b), (0, 0, 0));
        assert_eq!(a, 128);
    }

    #[test]
    fn test_offsets_scale_to_channel_range() {
        let mut matrix = IDENTITY_MATRIX;
        matrix[4] = 0.5;
        let mut image = solid(1, 1, [0, 0, 0, 255]);
        apply_color_matrix(&mut image, &matrix, false);
        assert_eq!(image.pixel(0, 0)[0], 128);
    }

    #[test]
    fn test_saturate_zero_is_grayscale() {
        let mut image = solid(1, 1, [255, 0, 0, 255]);
        apply_color_matrix(&mut image, &saturate_matrix(0.0), false);
        let [r, g, b, _] = image.pixel(0, 0);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_hue_rotate_zero_is_identity() {
        let matrix = hue_rotate_matrix(0.0);
        for (value, expected) in matrix.iter().zip(IDENTITY_MATRIX.iter()) {
            assert!((value - expected).abs() < 1e-3);
        }
    }

    #[test]
    fn test_unknown_matrix_falls_back_to_identity() {
        assert_eq!(color_matrix_for("matrix", &[]), IDENTITY_MATRIX);
        assert_eq!(color_matrix_for("matrix", &[1.0, 2.0]), IDENTITY_MATRIX);
    }

    #[test]
    fn test_multiply_alpha() {
        let mut image = solid(1, 1, [10, 20, 30, 200]);
        let mask = solid(1, 1, [0, 0, 0, 128]);
        multiply_alpha(&mut image, &mask);
        assert_eq!(image.pixel(0, 0)[3], 100);
    }
}
