//! Command-line interface parsing for folio
//!
//! This module handles parsing of CLI arguments using clap: one subcommand per
//! content query, plus `image` for building CDN image URLs.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::image::{preset_names, Dimensions, FitMode, ImageFormat, ImageSize, DEFAULT_QUALITY};

/// Error types for CLI argument validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    /// Neither a preset nor a full width/height pair was given
    #[error("Specify an image size with --preset or with both --width and --height")]
    MissingImageSize,

    /// Both a preset and explicit dimensions were given
    #[error("--preset cannot be combined with --width/--height")]
    ConflictingImageSize,

    /// The preset name is not recognized
    #[error("Invalid preset: '{name}'. Valid presets: {valid}")]
    InvalidPreset { name: String, valid: String },
}

/// folio - Query portfolio content from the CMS
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Portfolio content from the headless CMS, cached and retried")]
#[command(version)]
pub struct Cli {
    /// Read configuration from this dotenv file instead of ./.env
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List projects, newest first
    Projects {
        /// Only featured projects
        #[arg(long)]
        featured: bool,
    },
    /// Show one project
    Project {
        /// Project slug
        slug: String,
    },
    /// List playlists, most recently published first
    Playlists {
        /// Only featured playlists
        #[arg(long)]
        featured: bool,
    },
    /// Show one playlist
    Playlist {
        /// Playlist slug
        slug: String,
    },
    /// List playground posts, or show one by slug
    Playground {
        /// Playground post slug
        slug: Option<String>,
    },
    /// Show the about page
    About,
    /// The six newest projects and playlists
    Recent,
    /// Everything the home page shows: featured projects, featured playlists and recent content
    Home,
    /// Build an optimized CDN URL for an image asset
    Image(ImageArgs),
}

#[derive(Args, Debug, PartialEq)]
pub struct ImageArgs {
    /// Asset reference, e.g. image-Tb9Ew8CXIwaY6R1kjMvI0uRR-2000x3000-jpg
    pub asset_ref: String,

    /// Named size such as project.card or avatar.small
    #[arg(long)]
    pub preset: Option<String>,

    /// Width in pixels (requires --height)
    #[arg(long)]
    pub width: Option<u32>,

    /// Height in pixels (requires --width)
    #[arg(long)]
    pub height: Option<u32>,

    /// JPEG/WebP quality (1-100)
    #[arg(long, default_value_t = DEFAULT_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: u8,

    #[arg(long, value_enum, default_value_t = ImageFormat::Webp)]
    pub format: ImageFormat,

    #[arg(long, value_enum, default_value_t = FitMode::Crop)]
    pub fit: FitMode,

    /// Emit a srcset at 1x, 1.5x and 2x instead of a single URL
    #[arg(long)]
    pub responsive: bool,
}

impl ImageArgs {
    /// Resolves the size flags into a single image size
    ///
    /// # Returns
    /// * `Ok(ImageSize)` for a known preset or a complete width/height pair
    /// * `Err(CliError)` if the flags are missing, conflicting or name an unknown preset
    pub fn size(&self) -> Result<ImageSize, CliError> {
        match (&self.preset, self.width, self.height) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(CliError::ConflictingImageSize),
            (Some(name), None, None) => {
                if crate::image::preset(name).is_some() {
                    Ok(ImageSize::Preset(name.clone()))
                } else {
                    Err(CliError::InvalidPreset {
                        name: name.clone(),
                        valid: preset_names().join(", "),
                    })
                }
            }
            (None, Some(width), Some(height)) => {
                Ok(ImageSize::Custom(Dimensions::new(width, height)))
            }
            (None, _, _) => Err(CliError::MissingImageSize),
        }
    }
}
