//! Image resize tool
//!
//! Fetches an image, resizes it and returns a base64-encoded JPEG.
//! Decoding and encoding are CPU-bound and run on the blocking pool.

use crate::errors::ToolError;
use crate::net::BROWSER_HEADERS;
use crate::tools::implementations::scrape::parse_http_url;
use crate::tools::types::{parse_input, require_text, whole_number, Operation, OperationContext};
use crate::types::Request;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use url::Url;

/// Largest accepted target edge in pixels
pub const MAX_DIMENSION: i64 = 8_192;

#[derive(Debug, Deserialize)]
struct RawResizeInput {
    url: Option<String>,
    width: Option<f64>,
    height: Option<f64>,
    keep_aspect: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeInput {
    pub url: Url,
    pub width: u32,
    pub height: u32,
    pub keep_aspect: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResizeOutput {
    pub image_base64_jpeg: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ResizeOperation;

#[async_trait]
impl Operation for ResizeOperation {
    type Input = ResizeInput;
    type Output = ResizeOutput;

    fn name(&self) -> &'static str {
        "resize"
    }

    fn validate(&self, request: &Request) -> Result<ResizeInput, ToolError> {
        let raw: RawResizeInput = parse_input(request)?;
        let url = parse_http_url("url", require_text("url", raw.url)?)?;

        let dimensions = raw
            .width
            .and_then(whole_number)
            .zip(raw.height.and_then(whole_number));
        let (width, height) = match dimensions {
            Some((w, h)) if in_range(w) && in_range(h) => (w as u32, h as u32),
            _ => {
                return Err(ToolError::input_invalid(format!(
                    "`width` and `height` must be whole numbers between 1 and {}",
                    MAX_DIMENSION
                )))
            }
        };

        Ok(ResizeInput {
            url,
            width,
            height,
            keep_aspect: raw.keep_aspect.unwrap_or(true),
        })
    }

    async fn execute(
        &self,
        input: ResizeInput,
        ctx: OperationContext,
    ) -> Result<ResizeOutput, ToolError> {
        let bytes = ctx.fetcher().get(input.url.as_str(), BROWSER_HEADERS).await?;

        let (width, height, keep_aspect) = (input.width, input.height, input.keep_aspect);
        let jpeg = tokio::task::spawn_blocking(move || {
            resize_to_jpeg(&bytes, width, height, keep_aspect)
        })
        .await
        .map_err(|e| ToolError::unexpected(format!("image worker failed: {}", e)))??;

        Ok(ResizeOutput {
            image_base64_jpeg: BASE64_STANDARD.encode(jpeg),
        })
    }
}

fn in_range(n: i64) -> bool {
    (1..=MAX_DIMENSION).contains(&n)
}

/// Decode, resize and re-encode an image as JPEG.
///
/// With `keep_aspect`, the image is scaled to fit and centered on a black
/// canvas of exactly `width` x `height`.
pub fn resize_to_jpeg(
    bytes: &[u8],
    width: u32,
    height: u32,
    keep_aspect: bool,
) -> Result<Vec<u8>, ToolError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| ToolError::decode_failed("Unsupported/invalid image").caused_by(e))?;

    let canvas = if keep_aspect {
        contain(&img, width, height)
    } else {
        img.resize_exact(width, height, FilterType::Triangle).to_rgb8()
    };

    let mut out = Vec::new();
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .map_err(|e| ToolError::unexpected(format!("JPEG encoding failed: {}", e)))?;
    Ok(out)
}

/// Fit within `width` x `height` preserving aspect ratio, letterboxed
fn contain(img: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let fitted = img.resize(width, height, FilterType::Triangle).to_rgb8();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));

    let x = (width - fitted.width()) / 2;
    let y = (height - fitted.height()) / 2;
    imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
    canvas
}
