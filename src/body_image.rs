use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::body::Body;
use crate::content_type::ContentType;
use crate::error::BodyEncodeError;

/// An image serialized as the body of a request
#[derive(Debug, Clone)]
pub enum ImageBody {
    /// JPEG rendering with a compression quality between 0.0 and 1.0
    Jpeg {
        image: DynamicImage,
        compression_quality: f32,
    },
    /// PNG rendering
    Png { image: DynamicImage },
    /// Already encoded image data with an explicit content type
    Binary { data: Vec<u8>, content_type: ContentType },
}

impl ImageBody {
    /// Create a JPEG body
    pub fn jpeg(image: DynamicImage, compression_quality: f32) -> Self {
        ImageBody::Jpeg {
            image,
            compression_quality,
        }
    }

    /// Create a PNG body
    pub fn png(image: DynamicImage) -> Self {
        ImageBody::Png { image }
    }

    /// Create a body from encoded image data
    pub fn binary(data: Vec<u8>, content_type: ContentType) -> Self {
        ImageBody::Binary { data, content_type }
    }

    /// Render the image, or `None` if the codec fails
    pub fn raw_image(&self) -> Option<Vec<u8>> {
        match self {
            ImageBody::Jpeg {
                image,
                compression_quality,
            } => {
                let mut data = Vec::new();
                // JPEG carries no alpha channel
                let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
                let encoder = JpegEncoder::new_with_quality(&mut data, jpeg_quality(*compression_quality));
                rgb.write_with_encoder(encoder).ok()?;
                Some(data)
            }
            ImageBody::Png { image } => {
                let mut data = Vec::new();
                image.write_to(&mut Cursor::new(&mut data), ImageFormat::Png).ok()?;
                Some(data)
            }
            ImageBody::Binary { data, .. } => Some(data.clone()),
        }
    }
}

/// Map a 0.0-1.0 quality onto the encoder's 1-100 scale
fn jpeg_quality(compression_quality: f32) -> u8 {
    // NaN falls back to the lowest quality
    let quality = if compression_quality.is_nan() {
        0.0
    } else {
        compression_quality.clamp(0.0, 1.0)
    };
    ((quality * 100.0).round() as u8).max(1)
}

impl Body for ImageBody {
    fn content_type(&self) -> ContentType {
        match self {
            ImageBody::Jpeg { .. } => ContentType::Jpeg,
            ImageBody::Png { .. } => ContentType::Png,
            ImageBody::Binary { content_type, .. } => content_type.clone(),
        }
    }

    fn make_data(&self) -> Result<Vec<u8>, BodyEncodeError> {
        self.raw_image().ok_or_else(|| self.encode_error())
    }
}
