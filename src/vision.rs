// ABOUTME: Screenshot-to-conversation extraction via vision-capable models
// ABOUTME: Bounded downscale + JPEG re-encode ahead of vision dispatch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Wingmate Labs

//! # Vision Extraction Path
//!
//! Derives a structured conversation directly from a chat screenshot, as an
//! alternative to conventional text OCR. Before dispatch the input image is
//! downscaled (longest edge bounded, re-encoded at fixed JPEG quality) to
//! control per-call cost; the dispatcher assumes this has already happened
//! and never re-compresses.

use image::imageops::FilterType;
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::llm::{DispatchParams, FallbackDispatcher, ImageAttachment};
use crate::models::VisionExtraction;
use crate::parser;
use crate::prompts::vision as vision_prompts;

/// Longest edge of the image sent to vision providers
pub const MAX_DIMENSION: u32 = 1280;

/// Fixed JPEG re-encode quality
pub const JPEG_QUALITY: u8 = 80;

/// Maximum accepted input size, guards decode cost on adversarial uploads
const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Smallest byte count that can hold a valid image file
const MIN_IMAGE_BYTES: usize = 67;

/// Sampling parameters for vision extraction calls
const VISION_PARAMS: DispatchParams = DispatchParams {
    temperature: 0.3,
    max_tokens: 1000,
};

/// A screenshot prepared for vision dispatch
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// JPEG-encoded bytes, longest edge ≤ [`MAX_DIMENSION`]
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    /// Wrap the prepared bytes as a dispatch attachment
    #[must_use]
    pub fn into_attachment(self) -> ImageAttachment {
        ImageAttachment {
            data: self.data,
            mime_type: "image/jpeg".to_owned(),
        }
    }
}

/// Downscale and re-encode a screenshot for vision dispatch
///
/// The image is scaled so its longest edge is at most [`MAX_DIMENSION`]
/// (small images are not upscaled), then re-encoded as JPEG at
/// [`JPEG_QUALITY`]. Pure transform, no I/O.
///
/// # Errors
///
/// Returns `INVALID_INPUT` when the bytes are out of bounds or do not
/// decode as an image, and an internal error if re-encoding fails.
pub fn prepare_image(bytes: &[u8]) -> AppResult<PreparedImage> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(AppError::invalid_input("image data too small to be valid"));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::invalid_input(format!(
            "image data exceeds {}MB limit",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }

    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AppError::invalid_input(format!("failed to decode image: {e}")))?;
    let (original_width, original_height) = (decoded.width(), decoded.height());

    let resized = if original_width.max(original_height) > MAX_DIMENSION {
        decoded.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let (width, height) = (rgb.width(), rgb.height());

    let mut cursor = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| AppError::internal(format!("JPEG encoding failed: {e}")))?;
    let data = cursor.into_inner();

    debug!(
        original = format!("{original_width}x{original_height}"),
        prepared = format!("{width}x{height}"),
        jpeg_bytes = data.len(),
        "screenshot prepared for vision dispatch"
    );

    Ok(PreparedImage {
        data,
        width,
        height,
    })
}

/// Extract a structured conversation from a screenshot
///
/// Prepares the image, dispatches it across the vision fallback chain, and
/// validates the model's JSON into a [`VisionExtraction`].
///
/// # Errors
///
/// Returns `INVALID_INPUT` for undecodable images,
/// `ALL_PROVIDERS_EXHAUSTED` when no vision provider answers, and
/// `INVALID_MODEL_OUTPUT` when the answer has no usable conversation shape.
pub async fn extract_conversation(
    dispatcher: &FallbackDispatcher,
    image_bytes: &[u8],
) -> AppResult<(VisionExtraction, crate::llm::DispatchSuccess)> {
    let prepared = prepare_image(image_bytes)?;

    let outcome = dispatcher
        .dispatch_vision(
            vision_prompts::system_prompt(),
            vision_prompts::VISION_USER_MESSAGE,
            prepared.into_attachment(),
            VISION_PARAMS,
        )
        .await?;

    let extraction = parser::parse_vision_response(&outcome.content)?;

    debug!(
        platform = extraction.platform.as_str(),
        messages = extraction.messages.len(),
        confidence = extraction.confidence,
        "vision extraction complete"
    );

    Ok((extraction, outcome))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use image::{DynamicImage, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([120, 130, 140]),
        ));
        let mut cursor = Cursor::new(Vec::new());
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn oversized_image_bounded_to_max_dimension() {
        let bytes = png_bytes(2560, 1440);
        let prepared = prepare_image(&bytes).unwrap();

        assert_eq!(prepared.width.max(prepared.height), MAX_DIMENSION);
        // Aspect ratio preserved
        assert_eq!(prepared.width, 1280);
        assert_eq!(prepared.height, 720);
    }

    #[test]
    fn small_image_not_upscaled() {
        let bytes = png_bytes(400, 300);
        let prepared = prepare_image(&bytes).unwrap();

        assert_eq!(prepared.width, 400);
        assert_eq!(prepared.height, 300);
    }

    #[test]
    fn output_is_jpeg() {
        let bytes = png_bytes(200, 200);
        let prepared = prepare_image(&bytes).unwrap();

        // JPEG SOI marker
        assert_eq!(&prepared.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn tiny_input_rejected() {
        let err = prepare_image(&[0x89, 0x50]).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[test]
    fn garbage_input_rejected() {
        let garbage = [0xDE, 0xAD, 0xBE, 0xEF].repeat(32);
        assert!(prepare_image(&garbage).is_err());
    }
}
