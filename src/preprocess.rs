//! Turns the data URL posted by the drawing page into model input.
//!
//! The pipeline is: data URL -> base64 payload -> PNG bytes -> 8-bit grayscale ->
//! area-resampled `height x width` grid -> values in `[0, 1]` laid out as
//! `[1, height, width, 1]`.

use base64::{engine::general_purpose::STANDARD, Engine};
use burn::tensor::TensorData;
use image::GrayImage;

use crate::error::{Error, Result};

const DATA_URL_SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Returns the base64 payload of a `data:<mime>;base64,<payload>` URL.
pub fn parse_data_url(url: &str) -> Result<&str> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| Error::Payload("data URL has no ',' separator".to_string()))?;

    if !header.starts_with(DATA_URL_SCHEME) {
        return Err(Error::Payload(format!(
            "data URL must start with '{DATA_URL_SCHEME}'"
        )));
    }
    if !header.ends_with(BASE64_MARKER) {
        return Err(Error::Payload("data URL is not base64 encoded".to_string()));
    }

    Ok(payload)
}

/// Decodes the binary content carried by a base64 data URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let payload = parse_data_url(url)?;

    STANDARD
        .decode(payload.trim())
        .map_err(|err| Error::Payload(format!("malformed base64: {err}")))
}

/// Decodes an encoded image and prepares it for a model expecting `shape`.
///
/// `shape` must describe a single channel-last image: `[1, height, width, 1]`.
pub fn image_to_input(bytes: &[u8], shape: [usize; 4]) -> Result<TensorData> {
    let [batch, height, width, channels] = shape;
    if batch != 1 || channels != 1 || height == 0 || width == 0 {
        return Err(Error::Decode(format!(
            "cannot lay out a grayscale image as {shape:?}"
        )));
    }

    let image = image::load_from_memory(bytes)
        .map_err(|err| Error::Decode(err.to_string()))?
        .into_luma8();

    if image.width() == 0 || image.height() == 0 {
        return Err(Error::Decode("image is empty".to_string()));
    }

    let values = resize_area(&image, width, height)
        .into_iter()
        .map(|value| value / 255.0)
        .collect::<Vec<f32>>();

    Ok(TensorData::new(values, shape))
}

/// Full request path: data URL to model input.
pub fn data_url_to_input(url: &str, shape: [usize; 4]) -> Result<TensorData> {
    let bytes = decode_data_url(url)?;
    image_to_input(&bytes, shape)
}

/// Resamples `image` to `width x height` with area interpolation.
///
/// Every output pixel is the mean of the source pixels under its footprint, each
/// weighted by how much of it the footprint covers. The result is row-major and
/// keeps the `[0, 255]` range without rounding.
fn resize_area(image: &GrayImage, width: usize, height: usize) -> Vec<f32> {
    let rows = footprints(image.height() as usize, height);
    let cols = footprints(image.width() as usize, width);
    let mut output = Vec::with_capacity(width * height);

    for row in rows.iter() {
        for col in cols.iter() {
            let mut sum = 0.0;
            let mut total = 0.0;

            for &(y, weight_y) in row {
                for &(x, weight_x) in col {
                    let weight = weight_y * weight_x;
                    sum += weight * image.get_pixel(x as u32, y as u32).0[0] as f64;
                    total += weight;
                }
            }

            output.push((sum / total) as f32);
        }
    }

    output
}

/// For each destination index, the source indices it overlaps and the overlap length.
fn footprints(src: usize, dst: usize) -> Vec<Vec<(usize, f64)>> {
    let scale = src as f64 / dst as f64;

    (0..dst)
        .map(|index| {
            let start = index as f64 * scale;
            let end = start + scale;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src);

            (first..last)
                .filter_map(|source| {
                    let overlap = end.min((source + 1) as f64) - start.max(source as f64);
                    (overlap > 0.0).then_some((source, overlap))
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Luma, Rgba, RgbaImage};
    use rstest::rstest;
    use std::io::Cursor;

    const MNIST_SHAPE: [usize; 4] = [1, 28, 28, 1];

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn data_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(bytes))
    }

    fn values(data: TensorData) -> Vec<f32> {
        data.to_vec::<f32>().unwrap()
    }

    #[test]
    fn parse_data_url_returns_payload() {
        let payload = parse_data_url("data:image/png;base64,iVBORw0KGgo=").unwrap();

        assert_eq!(payload, "iVBORw0KGgo=");
    }

    #[rstest]
    #[case::missing_comma("data:image/png;base64")]
    #[case::missing_scheme("image/png;base64,AAAA")]
    #[case::not_base64("data:image/png,AAAA")]
    #[case::empty("")]
    fn parse_data_url_rejects_malformed_urls(#[case] url: &str) {
        assert!(matches!(parse_data_url(url), Err(Error::Payload(_))));
    }

    #[test]
    fn decode_data_url_rejects_bad_base64() {
        let result = decode_data_url("data:image/png;base64,@@not base64@@");

        assert!(matches!(result, Err(Error::Payload(_))));
    }

    #[test]
    fn decode_data_url_round_trips_bytes() {
        let bytes = decode_data_url(&data_url(b"digit")).unwrap();

        assert_eq!(bytes, b"digit");
    }

    #[test]
    fn non_image_bytes_are_a_decode_error() {
        let result = image_to_input(b"definitely not a png", MNIST_SHAPE);

        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[rstest]
    #[case::batched([2, 28, 28, 1])]
    #[case::rgb([1, 28, 28, 3])]
    #[case::empty([1, 0, 28, 1])]
    fn unsupported_shapes_are_a_decode_error(#[case] shape: [usize; 4]) {
        let png = encode_png(DynamicImage::ImageLuma8(GrayImage::new(28, 28)));

        assert!(matches!(image_to_input(&png, shape), Err(Error::Decode(_))));
    }

    #[rstest]
    #[case(0)]
    #[case(51)]
    #[case(128)]
    #[case(255)]
    fn uniform_canvas_normalizes_to_its_intensity(#[case] intensity: u8) {
        let canvas = GrayImage::from_pixel(280, 280, Luma([intensity]));
        let png = encode_png(DynamicImage::ImageLuma8(canvas));

        let data = image_to_input(&png, MNIST_SHAPE).unwrap();

        assert_eq!(data.shape, MNIST_SHAPE.to_vec());
        let expected = intensity as f32 / 255.0;
        for value in values(data) {
            assert!((value - expected).abs() < 1e-6, "{value} != {expected}");
        }
    }

    #[test]
    fn stroke_is_averaged_over_its_block() {
        // White 10x10 square in the top left corner, half covered block next to it.
        let mut canvas = RgbaImage::from_pixel(280, 280, Rgba([0, 0, 0, 255]));
        for y in 0..10 {
            for x in 0..15 {
                canvas.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        let png = encode_png(DynamicImage::ImageRgba8(canvas));

        let values = values(image_to_input(&png, MNIST_SHAPE).unwrap());

        assert!((values[0] - 1.0).abs() < 1e-6);
        assert!((values[1] - 0.5).abs() < 1e-6);
        assert!(values[2..].iter().all(|value| *value == 0.0));
    }

    #[test]
    fn fractional_footprints_are_weighted_by_coverage() {
        let mut row = GrayImage::new(3, 1);
        row.put_pixel(0, 0, Luma([0]));
        row.put_pixel(1, 0, Luma([90]));
        row.put_pixel(2, 0, Luma([180]));

        let resized = resize_area(&row, 2, 1);

        assert!((resized[0] - 30.0).abs() < 1e-4);
        assert!((resized[1] - 150.0).abs() < 1e-4);
    }

    #[test]
    fn full_path_from_data_url() {
        let canvas = GrayImage::from_pixel(280, 280, Luma([255]));
        let url = data_url(&encode_png(DynamicImage::ImageLuma8(canvas)));

        let data = data_url_to_input(&url, MNIST_SHAPE).unwrap();

        assert_eq!(data.num_elements(), 28 * 28);
    }
}
