//! Request level entry points, independent of any HTTP framework.
//!
//! Handlers of a web server map one to one onto the methods of
//! [CropService]: `GET /health`, `GET /date/{image}/crop_by_bounding_box`
//! with the box as query parameters, and `POST /date/{image}/crop_by_geojson`
//! with the GeoJSON document as body.

use std::path::{Component, Path};

use log::{error, info};
use serde::Serialize;

use crate::{
    components::{BoundingBox, GeoJson},
    crop::{crop_with, CropRequest},
    errors::CropError,
    settings::Settings,
};

pub const OUTPUT_FILENAME: &str = "output.tif";
pub const OUTPUT_MEDIA_TYPE: &str = "image/tiff";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
}

/// GeoTIFF returned to the client as a file download.
#[derive(Debug, Clone)]
pub struct CropResponse {
    pub bytes: Vec<u8>,
    pub filename: &'static str,
    pub media_type: &'static str,
}

impl CropResponse {
    fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            filename: OUTPUT_FILENAME,
            media_type: OUTPUT_MEDIA_TYPE,
        }
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,
    pub body: ErrorBody,
}

impl From<CropError> for ErrorResponse {
    fn from(err: CropError) -> Self {
        if err.is_not_found() {
            info!("{err}");
            ErrorResponse {
                status: 400,
                body: ErrorBody {
                    error: "image not found",
                    detail: Some(err.to_string()),
                },
            }
        } else {
            error!("crop failed: {err}");
            ErrorResponse {
                status: 500,
                body: ErrorBody {
                    error: "processing failed",
                    detail: None,
                },
            }
        }
    }
}

pub struct CropService {
    settings: Settings,
}

impl CropService {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn health(&self) -> Health {
        Health {
            status: "I'm alive",
        }
    }

    pub fn crop_by_bounding_box(
        &self,
        image: &str,
        bbox: BoundingBox,
    ) -> Result<CropResponse, ErrorResponse> {
        self.crop(image, CropRequest::BoundingBox(bbox))
    }

    pub fn crop_by_geojson<G: Into<GeoJson>>(
        &self,
        image: &str,
        body: G,
    ) -> Result<CropResponse, ErrorResponse> {
        self.crop(image, CropRequest::Geometry(body.into()))
    }

    fn crop(&self, image: &str, request: CropRequest) -> Result<CropResponse, ErrorResponse> {
        let path = self.settings.image_path(image);
        if !is_plain_name(image) {
            return Err(CropError::DatasetNotFound(path).into());
        }
        let cropped = crop_with(&path, &request, &self.settings.crop_options())?;
        Ok(CropResponse::new(cropped.bytes))
    }
}

/// Image names must not leave the image directory.
fn is_plain_name(image: &str) -> bool {
    let mut components = Path::new(image).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !image.contains(['/', '\\'])
}
