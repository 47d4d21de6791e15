use std::path::Path;

use crate::core::{GymError, RenderFrame, Result};

/// Encode a RenderFrame::Pixels to a PNG byte vector.
/// - When the `image` feature is enabled, this will encode using the `image` crate.
/// - Without the feature, returns GymError::NotSupported.
pub fn encode_png(frame: &RenderFrame) -> Result<Vec<u8>> {
    match frame {
        RenderFrame::Pixels { width, height, data } => encode_pixels_png(*width, *height, data),
        RenderFrame::Text(_) => Err(GymError::NotSupported("Text frames cannot be encoded to PNG".into())),
    }
}

#[cfg(feature = "image")]
fn encode_pixels_png(width: u32, height: u32, pixels: &[u8]) -> Result<Vec<u8>> {
    use image::codecs::png::PngEncoder;
    use image::{ColorType, ImageEncoder};
    use std::io::Cursor;

    let count = (width as usize) * (height as usize);
    let color = if pixels.len() == count {
        ColorType::L8
    } else if pixels.len() == count * 3 {
        ColorType::Rgb8
    } else if pixels.len() == count * 4 {
        ColorType::Rgba8
    } else {
        return Err(GymError::InvalidObservation(format!(
            "Pixel data length {} does not match width*height*{{1,3,4}} ({}x{})",
            pixels.len(), width, height
        )));
    };

    let mut buf = Vec::new();
    PngEncoder::new(Cursor::new(&mut buf))
        .write_image(pixels, width, height, color.into())
        .map_err(|e| GymError::Other(format!("PNG encode error: {}", e)))?;
    Ok(buf)
}

#[cfg(not(feature = "image"))]
fn encode_pixels_png(_width: u32, _height: u32, _pixels: &[u8]) -> Result<Vec<u8>> {
    Err(GymError::NotSupported(
        "PNG encoding requires the `image` feature".into(),
    ))
}

/// Save a RenderFrame::Pixels as a PNG file at the given path.
/// Requires the `image` feature; otherwise returns NotSupported.
pub fn save_png<P: AsRef<Path>>(path: P, frame: &RenderFrame) -> Result<()> {
    let bytes = encode_png(frame)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_2x2() -> RenderFrame {
        RenderFrame::Pixels { width: 2, height: 2, data: vec![255, 0, 0, 255,  0, 255, 0, 255,  0, 0, 255, 255,  255, 255, 255, 255] }
    }

    #[test]
    fn text_frames_are_not_encodable() {
        let err = encode_png(&RenderFrame::Text("car".into())).unwrap_err();
        assert!(matches!(err, GymError::NotSupported(_)));
    }

    #[cfg(not(feature = "image"))]
    #[test]
    fn encode_png_without_feature_not_supported() {
        let err = encode_png(&rgba_2x2()).unwrap_err();
        match err {
            GymError::NotSupported(_) => {}
            other => panic!("Expected NotSupported, got {:?}", other),
        }
    }

    #[cfg(feature = "image")]
    #[test]
    fn encode_png_with_feature_produces_png_signature() {
        let bytes = encode_png(&rgba_2x2()).expect("PNG encoding should succeed");
        assert_eq!(&bytes[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn grayscale_frames_encode() {
        let frame = RenderFrame::Pixels { width: 3, height: 1, data: vec![0, 128, 255] };
        assert!(encode_png(&frame).is_ok());
        let bad = RenderFrame::Pixels { width: 3, height: 1, data: vec![0, 128] };
        assert!(matches!(encode_png(&bad), Err(GymError::InvalidObservation(_))));
    }
}
