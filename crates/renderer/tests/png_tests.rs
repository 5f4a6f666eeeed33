//! PNG encoding of rendered figures.

use image::{Rgba, RgbaImage};
use renderer::png::{create_png, create_png_auto, encode_png, write_png};
use test_utils::temp_test_dir;

fn banded_image(width: u32, height: u32, bands: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        let band = (x * bands / width) as u8;
        Rgba([band * 10, 255 - band * 10, 128, 255])
    })
}

#[test]
fn test_banded_figure_is_indexed_and_decodes() {
    let img = banded_image(200, 100, 20);
    let png = encode_png(&img).unwrap();
    // IHDR color type 3
    assert_eq!(png[25], 3);

    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (200, 100));
    assert_eq!(decoded, img);
}

#[test]
fn test_many_colors_fall_back_to_rgba_and_decode() {
    let img = RgbaImage::from_fn(64, 64, |x, y| Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]));
    let png = encode_png(&img).unwrap();
    assert_eq!(png[25], 6);
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded, img);
}

#[test]
fn test_indexed_is_smaller_than_rgba() {
    let img = banded_image(256, 256, 21);
    let indexed = create_png_auto(img.as_raw(), 256, 256).unwrap();
    let rgba = create_png(img.as_raw(), 256, 256).unwrap();
    assert!(indexed.len() < rgba.len(), "{} vs {}", indexed.len(), rgba.len());
}

#[test]
fn test_transparency_survives_palette() {
    let mut img = banded_image(16, 16, 4);
    img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    let decoded = image::load_from_memory(&encode_png(&img).unwrap()).unwrap().to_rgba8();
    assert_eq!(decoded.get_pixel(0, 0).0[3], 0);
    assert_eq!(decoded.get_pixel(15, 15).0[3], 255);
}

#[test]
fn test_write_png_to_disk() {
    let dir = temp_test_dir();
    let path = dir.path().join("frame.png");
    write_png(&path, &banded_image(32, 8, 4)).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[1..4], b"PNG");
}
