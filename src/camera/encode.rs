use image::{codecs::jpeg::JpegEncoder, RgbImage};

use super::capability::{CameraError, Frame};

pub const JPEG_QUALITY: u8 = 85;

pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CameraError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(CameraError::Encoding("empty frame".into()));
    }

    let image = RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone()).ok_or_else(|| {
        CameraError::Encoding(format!(
            "frame buffer of {} bytes does not match {}x{}",
            frame.rgb.len(),
            frame.width,
            frame.height
        ))
    })?;

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality)
        .encode_image(&image)
        .map_err(|err| CameraError::Encoding(err.to_string()))?;
    Ok(bytes)
}
