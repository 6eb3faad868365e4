//! PNG encoding of captured frames

use image::ImageEncoder;
use image::codecs::png::PngEncoder;

use crate::render::target::CaptureError;

/// Encode raw RGBA pixel data as an in-memory PNG
///
/// # Arguments
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `data` - RGBA u8 pixel data (length must be width * height * 4)
pub fn encode_png(width: u32, height: u32, data: &[u8]) -> Result<Vec<u8>, CaptureError> {
    if width == 0 || height == 0 {
        return Err(CaptureError::Encode(format!(
            "Invalid dimensions: {}x{}",
            width, height
        )));
    }

    let expected_len = width as usize * height as usize * 4;
    if data.len() != expected_len {
        return Err(CaptureError::Encode(format!(
            "Data length {} doesn't match expected {} ({}x{}x4)",
            data.len(),
            expected_len,
            width,
            height
        )));
    }

    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded)
        .write_image(data, width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;

    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_png() {
        let red_pixel = [255u8, 0, 0, 255];
        let data: Vec<u8> = red_pixel.iter().cycle().take(2 * 3 * 4).copied().collect();

        let encoded = encode_png(2, 3, &data).unwrap();
        assert_eq!(&encoded[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&encoded).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (2, 3));
        assert_eq!(decoded.get_pixel(1, 2).0, red_pixel);
    }

    #[test]
    fn test_invalid_dimensions() {
        let result = encode_png(0, 100, &[]);
        assert!(matches!(result, Err(CaptureError::Encode(_))));
    }

    #[test]
    fn test_wrong_data_length() {
        let result = encode_png(10, 10, &[0u8; 100]);
        assert!(matches!(result, Err(CaptureError::Encode(_))));
    }
}
