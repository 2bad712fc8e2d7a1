//! Document normalization.
//!
//! Inputs declared as PDF pass through untouched. Anything else is decoded
//! as a single raster image and re-encoded as a one-page PDF. Decoding and
//! re-encoding are CPU-bound; the pipeline runs them on the blocking pool.

use std::io::Cursor;

use image::ImageReader;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, RawImage, RawImageData, RawImageFormat,
    XObjectTransform,
};
use thiserror::Error;

/// MIME type of the normalization target.
pub const PDF_MIME: &str = "application/pdf";

/// Render DPI for paging a raster image.
const RASTER_DPI: f32 = 96.0;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("could not decode source image: {0}")]
    Decode(String),

    #[error("could not encode document: {0}")]
    Encode(String),
}

/// Normalize source bytes to PDF based on the declared MIME type.
pub fn ensure_pdf(mime_type: &str, data: Vec<u8>) -> Result<Vec<u8>, ConvertError> {
    if mime_type == PDF_MIME {
        return Ok(data);
    }

    image_to_pdf(&data)
}

/// Re-encode one raster image as a single-page PDF sized to the image.
pub fn image_to_pdf(data: &[u8]) -> Result<Vec<u8>, ConvertError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| ConvertError::Decode(e.to_string()))?;
    let decoded = reader
        .decode()
        .map_err(|e| ConvertError::Decode(e.to_string()))?;

    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let raw = RawImage {
        pixels: RawImageData::U8(rgb.into_raw()),
        width: width as usize,
        height: height as usize,
        data_format: RawImageFormat::RGB8,
        tag: Vec::new(),
    };

    let page_width = Mm(width as f32 * 25.4 / RASTER_DPI);
    let page_height = Mm(height as f32 * 25.4 / RASTER_DPI);

    let mut doc = PdfDocument::new("resume");
    let image_id = doc.add_image(&raw);

    let ops = vec![Op::UseXobject {
        id: image_id,
        transform: XObjectTransform {
            // Default image DPI is 300; place at the DPI the page was sized for.
            dpi: Some(RASTER_DPI),
            ..Default::default()
        },
    }];
    doc.pages.push(PdfPage::new(page_width, page_height, ops));

    let mut warnings = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    if bytes.is_empty() {
        return Err(ConvertError::Encode("produced an empty document".to_string()));
    }

    Ok(bytes)
}
