//! Image URL helpers for the Sanity image CDN
//!
//! Turns image asset references into transformed CDN URLs, with the size
//! presets used across the site and `srcset` generation for responsive images.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::data::SanityImage;

/// Host serving transformed images
const IMAGE_CDN_BASE_URL: &str = "https://cdn.sanity.io/images";

/// Default quality for optimized images
pub const DEFAULT_QUALITY: u8 = 85;

/// Default pixel-density scales for responsive images
pub const DEFAULT_SCALES: [f64; 3] = [1.0, 1.5, 2.0];

/// Errors that can occur when building image URLs
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    /// The image field has no asset attached
    #[error("Invalid image source: missing asset reference")]
    MissingAsset,

    /// The asset reference does not look like `image-<id>-<w>x<h>-<ext>`
    #[error("Invalid image asset reference: {0}")]
    InvalidReference(String),

    /// No preset with this name
    #[error("Unknown image preset: {0}")]
    UnknownPreset(String),
}

/// Output format requested from the CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ImageFormat {
    #[default]
    Webp,
    Jpg,
    Png,
    /// Let the CDN pick the best format the browser accepts
    Auto,
}

impl ImageFormat {
    fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Auto => "auto",
        }
    }
}

/// How the image is fitted into the requested box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FitMode {
    #[default]
    Crop,
    Fill,
    Fillmax,
    Max,
    Scale,
    Clip,
    Min,
}

impl FitMode {
    fn as_str(&self) -> &'static str {
        match self {
            FitMode::Crop => "crop",
            FitMode::Fill => "fill",
            FitMode::Fillmax => "fillmax",
            FitMode::Max => "max",
            FitMode::Scale => "scale",
            FitMode::Clip => "clip",
            FitMode::Min => "min",
        }
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Both sides multiplied by `scale`, rounded to the nearest pixel
    pub fn scaled(&self, scale: f64) -> Self {
        Self {
            width: (f64::from(self.width) * scale).round() as u32,
            height: (f64::from(self.height) * scale).round() as u32,
        }
    }
}

/// Named sizes used across the site, as `(category, variant, dimensions)`
const PRESETS: &[(&str, &str, Dimensions)] = &[
    ("avatar", "small", Dimensions::new(64, 64)),
    ("avatar", "medium", Dimensions::new(128, 128)),
    ("avatar", "large", Dimensions::new(256, 256)),
    ("playlist", "thumbnail", Dimensions::new(200, 200)),
    ("playlist", "card", Dimensions::new(300, 300)),
    ("playlist", "hero", Dimensions::new(600, 600)),
    ("project", "thumbnail", Dimensions::new(300, 200)),
    ("project", "card", Dimensions::new(500, 300)),
    ("project", "hero", Dimensions::new(1200, 800)),
    ("playground", "thumbnail", Dimensions::new(200, 200)),
    ("playground", "card", Dimensions::new(400, 400)),
    ("playground", "featured", Dimensions::new(800, 600)),
];

/// Looks up a preset by its `category.variant` name, e.g. `project.card`
pub fn preset(name: &str) -> Option<Dimensions> {
    let (category, variant) = name.split_once('.')?;
    PRESETS
        .iter()
        .find(|(c, v, _)| *c == category && *v == variant)
        .map(|(_, _, dims)| *dims)
}

/// Names of every preset, in `category.variant` form
pub fn preset_names() -> Vec<String> {
    PRESETS
        .iter()
        .map(|(c, v, _)| format!("{}.{}", c, v))
        .collect()
}

/// Requested image size: a named preset or explicit dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSize {
    Preset(String),
    Custom(Dimensions),
}

impl ImageSize {
    pub fn resolve(&self) -> Result<Dimensions, ImageError> {
        match self {
            ImageSize::Preset(name) => {
                preset(name).ok_or_else(|| ImageError::UnknownPreset(name.clone()))
            }
            ImageSize::Custom(dims) => Ok(*dims),
        }
    }
}

/// A parsed image asset reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub id: String,
    pub dimensions: Dimensions,
    pub extension: String,
}

impl AssetRef {
    /// Parses `image-<id>-<width>x<height>-<extension>`
    pub fn parse(reference: &str) -> Result<Self, ImageError> {
        let invalid = || ImageError::InvalidReference(reference.to_string());

        let rest = reference.strip_prefix("image-").ok_or_else(invalid)?;
        let (rest, extension) = rest.rsplit_once('-').ok_or_else(invalid)?;
        let (id, size) = rest.rsplit_once('-').ok_or_else(invalid)?;
        let (width, height) = size.split_once('x').ok_or_else(invalid)?;

        let width = width.parse::<u32>().map_err(|_| invalid())?;
        let height = height.parse::<u32>().map_err(|_| invalid())?;
        if id.is_empty() || extension.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            id: id.to_string(),
            dimensions: Dimensions::new(width, height),
            extension: extension.to_string(),
        })
    }

    /// File name on the CDN, e.g. `abc-2000x3000.jpg`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}x{}.{}",
            self.id, self.dimensions.width, self.dimensions.height, self.extension
        )
    }
}

/// Builds image URLs for one project and dataset
#[derive(Debug, Clone)]
pub struct ImageUrlBuilder {
    project_id: String,
    dataset: String,
}

impl ImageUrlBuilder {
    pub fn new(project_id: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: dataset.into(),
        }
    }

    /// Starts a URL for the given image field
    pub fn image(&self, source: &SanityImage) -> Result<ImageUrl, ImageError> {
        let asset = source.asset.as_ref().ok_or(ImageError::MissingAsset)?;
        self.image_ref(&asset.reference)
    }

    /// Starts a URL for a raw asset reference
    pub fn image_ref(&self, reference: &str) -> Result<ImageUrl, ImageError> {
        let asset = AssetRef::parse(reference)?;
        Ok(ImageUrl {
            base: format!(
                "{}/{}/{}/{}",
                IMAGE_CDN_BASE_URL,
                self.project_id,
                self.dataset,
                asset.file_name()
            ),
            width: None,
            height: None,
            quality: None,
            format: None,
            fit: None,
        })
    }

    /// A single optimized image at a fixed size
    pub fn optimized_image(
        &self,
        source: &SanityImage,
        size: &ImageSize,
        options: &ImageOptions,
    ) -> Result<ImageProps, ImageError> {
        let dims = size.resolve()?;
        let src = self
            .image(source)?
            .size(dims)
            .quality(options.quality)
            .format(options.format)
            .fit(options.fit)
            .url();

        Ok(ImageProps {
            src,
            width: dims.width,
            height: dims.height,
            loading: "lazy",
        })
    }

    /// An image with a `srcset` covering several pixel densities
    ///
    /// The fallback `src` is always a JPEG at the base size.
    pub fn responsive_image(
        &self,
        source: &SanityImage,
        base: Dimensions,
        options: &ImageOptions,
        scales: &[f64],
    ) -> Result<ResponsiveImageProps, ImageError> {
        let image = self.image(source)?;

        let src_set = scales
            .iter()
            .map(|&scale| {
                let url = image
                    .clone()
                    .size(base.scaled(scale))
                    .quality(options.quality)
                    .format(options.format)
                    .fit(options.fit)
                    .url();
                format!("{} {}x", url, scale)
            })
            .collect::<Vec<_>>()
            .join(", ");

        let src = image
            .size(base)
            .quality(options.quality)
            .format(ImageFormat::Jpg)
            .fit(options.fit)
            .url();

        Ok(ResponsiveImageProps {
            src,
            src_set,
            width: base.width,
            height: base.height,
            loading: "lazy",
        })
    }
}

/// Transformation options shared by the optimized-image helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub quality: u8,
    pub format: ImageFormat,
    pub fit: FitMode,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            format: ImageFormat::Webp,
            fit: FitMode::Crop,
        }
    }
}

/// A CDN image URL under construction
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUrl {
    base: String,
    width: Option<u32>,
    height: Option<u32>,
    quality: Option<u8>,
    format: Option<ImageFormat>,
    fit: Option<FitMode>,
}

impl ImageUrl {
    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    pub fn size(self, dims: Dimensions) -> Self {
        self.width(dims.width).height(dims.height)
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality.min(100));
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn fit(mut self, fit: FitMode) -> Self {
        self.fit = Some(fit);
        self
    }

    /// Renders the final URL
    pub fn url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params: Vec<String> = Vec::new();
        if let Some(w) = self.width {
            params.push(format!("w={}", w));
        }
        if let Some(h) = self.height {
            params.push(format!("h={}", h));
        }
        if let Some(q) = self.quality {
            params.push(format!("q={}", q));
        }
        match self.format {
            Some(ImageFormat::Auto) => params.push("auto=format".to_string()),
            Some(format) => params.push(format!("fm={}", format.as_str())),
            None => {}
        }
        if let Some(fit) = self.fit {
            params.push(format!("fit={}", fit.as_str()));
        }

        f.write_str(&self.base)?;
        if !params.is_empty() {
            write!(f, "?{}", params.join("&"))?;
        }
        Ok(())
    }
}

/// Attributes for a plain `<img>` element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageProps {
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub loading: &'static str,
}

/// Attributes for an `<img>` element with a density `srcset`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsiveImageProps {
    pub src: String,
    pub src_set: String,
    pub width: u32,
    pub height: u32,
    pub loading: &'static str,
}
