//! Preview rendering decoded back with an independent PNG reader.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use preview::{encode_rgba, OverlayPalette, PreviewConfig, PreviewRenderer};
use test_utils::{assert_approx_eq, band, lisbon_aoi, uniform_band, SCL_VEGETATION, SCL_WATER};
use vegetation::VegetationIndexEngine;

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(png, ImageFormat::Png)
        .unwrap()
        .to_rgba8()
}

#[test]
fn test_encoded_png_decodes() {
    let mut pixels = Vec::new();
    for i in 0..(7 * 5) {
        pixels.extend_from_slice(&[i as u8, 255 - i as u8, 7, 200]);
    }

    let img = decode(&encode_rgba(&pixels, 7, 5).unwrap());

    assert_eq!(img.dimensions(), (7, 5));
    assert_eq!(img.as_raw(), &pixels);
}

#[test]
fn test_renders_masked_index() {
    let aoi = lisbon_aoi();
    // NDVI per pixel: 0.8, water, -0.5, 0.2
    let red = band(vec![100.0, 100.0, 300.0, 400.0], 2, 2, &aoi);
    let nir = band(vec![900.0, 300.0, 100.0, 600.0], 2, 2, &aoi);
    let mask = band(
        vec![SCL_VEGETATION, SCL_WATER, SCL_VEGETATION, SCL_VEGETATION],
        2,
        2,
        &aoi,
    );
    let index = VegetationIndexEngine::default()
        .compute_index(&red, &nir, &mask)
        .unwrap();

    let preview = PreviewRenderer::default().render(&index).unwrap();

    assert_eq!(preview.media_type, "image/png");
    assert_eq!((preview.width, preview.height), (2, 2));
    assert_approx_eq!(preview.bounds[0][0], 38.60, 1e-9);
    assert_approx_eq!(preview.bounds[0][1], -8.95, 1e-9);
    assert_approx_eq!(preview.bounds[1][0], 38.70, 1e-9);
    assert_approx_eq!(preview.bounds[1][1], -8.85, 1e-9);

    let img = decode(&BASE64.decode(&preview.data_base64).unwrap());
    assert_eq!(img.get_pixel(0, 0).0, [26, 152, 80, 160]);
    assert_eq!(img.get_pixel(1, 0).0, [0, 0, 0, 0]);
    assert_eq!(img.get_pixel(0, 1).0, [215, 48, 39, 160]);
    assert_eq!(img.get_pixel(1, 1).0, [253, 231, 37, 160]);
}

#[test]
fn test_renders_true_color() {
    let aoi = lisbon_aoi();
    // NaN marks a pixel the crop endpoint left empty
    let red = band(vec![3000.0, 6000.0, f32::NAN, 1500.0], 2, 2, &aoi);
    let green = uniform_band(1500.0, 2, 2, &aoi);
    let blue = band(vec![0.0, 3000.0, 3000.0, 300.0], 2, 2, &aoi);

    let preview = PreviewRenderer::default()
        .render_true_color(&red, &green, &blue)
        .unwrap();

    assert_eq!((preview.width, preview.height), (2, 2));
    assert_approx_eq!(preview.bounds[1][1], -8.85, 1e-9);

    let img = decode(&BASE64.decode(&preview.data_base64).unwrap());
    assert_eq!(img.get_pixel(1, 0).0, [255, 127, 255, 255]);
    assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0, 0]);
    assert_eq!(img.get_pixel(1, 1).0, [127, 127, 25, 255]);
}

#[test]
fn test_config_from_yaml() {
    let yaml = r#"
enabled: false
palette:
  alpha: 255
  dense_threshold: 0.6
"#;
    let config: PreviewConfig = serde_yaml::from_str(yaml).unwrap();

    assert!(!config.enabled);
    assert!(config.validate().is_ok());
    assert_eq!(config.palette.alpha, 255);
    assert_eq!(config.palette.dense, OverlayPalette::default().dense);
    assert_eq!(config.true_color.max_reflectance, 3000.0);

    let bad = PreviewConfig {
        palette: OverlayPalette {
            dense_threshold: 1.5,
            ..OverlayPalette::default()
        },
        ..PreviewConfig::default()
    };
    assert!(bad.validate().is_err());
}
