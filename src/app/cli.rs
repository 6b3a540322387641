use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::api::{OutputFormat, ResizeMode, ScaleFactor};
use crate::crop::AspectPreset;
use crate::geometry::Color;

/// Upload an image, run one PixelMagic tool on it and download the result.
#[derive(Debug, Parser)]
#[command(name = "pixelmagic", author, version, about, long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-v: debug, -vv: trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of the user config dir.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// API base url, overriding config and environment.
    #[arg(long, value_name = "URL", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the API is reachable.
    Health,
    /// Remove the image background.
    RemoveBg(RemoveBgArgs),
    /// Crop a region given in source pixels.
    Crop(CropArgs),
    /// Resize to explicit dimensions.
    Resize(ResizeArgs),
    /// Upscale by 2x, 4x or 8x.
    Upscale(UpscaleArgs),
}

#[derive(Debug, Args)]
pub struct IoArgs {
    /// Image to upload (JPG, PNG or WEBP, at most 10MB).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the result. Defaults to the download dir.
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RemoveBgArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[arg(long, default_value_t = 0)]
    pub softness: u8,

    #[arg(long, default_value_t = 0)]
    pub feather: u8,

    /// Backdrop color for the local preview, e.g. `#ffffff`.
    #[arg(long, value_name = "HEX", value_parser = parse_color)]
    pub background: Option<Color>,

    /// Also write a preview composited over the backdrop.
    #[arg(long, value_name = "PATH")]
    pub preview: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CropArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Left edge in source pixels.
    #[arg(long)]
    pub x: Option<String>,

    /// Top edge in source pixels.
    #[arg(long)]
    pub y: Option<String>,

    #[arg(long)]
    pub width: Option<String>,

    #[arg(long)]
    pub height: Option<String>,

    /// Aspect lock: Free, 1:1, 4:3, 3:2, 16:9, 9:16 or Original.
    #[arg(long, value_name = "RATIO", default_value = "Free", value_parser = parse_aspect)]
    pub aspect: AspectPreset,

    /// Also write a local preview of the selected region.
    #[arg(long, value_name = "PATH")]
    pub preview: Option<PathBuf>,
}

impl CropArgs {
    pub fn has_manual_fields(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.width.is_some() || self.height.is_some()
    }
}

#[derive(Debug, Args)]
pub struct ResizeArgs {
    #[command(flatten)]
    pub io: IoArgs,

    /// Target width. Given alone, the height follows the source ratio.
    #[arg(long)]
    pub width: Option<u32>,

    /// Target height. Given alone, the width follows the source ratio.
    #[arg(long)]
    pub height: Option<u32>,

    #[arg(long, default_value = "fit", value_parser = parse_mode)]
    pub mode: ResizeMode,

    #[arg(long, default_value = "png", value_parser = parse_format)]
    pub format: OutputFormat,

    /// JPG quality, 1 to 100.
    #[arg(long, default_value_t = 90)]
    pub quality: u8,
}

#[derive(Debug, Args)]
pub struct UpscaleArgs {
    #[command(flatten)]
    pub io: IoArgs,

    #[arg(long, default_value = "2", value_parser = parse_scale)]
    pub scale: ScaleFactor,
}

fn parse_color(raw: &str) -> Result<Color, String> {
    Color::from_hex(raw).ok_or_else(|| format!("`{raw}` is not a #rrggbb color"))
}

fn parse_aspect(raw: &str) -> Result<AspectPreset, String> {
    AspectPreset::from_label(raw).ok_or_else(|| {
        let known: Vec<_> = AspectPreset::ALL.iter().map(|preset| preset.label()).collect();
        format!("unknown aspect `{raw}`, expected one of {}", known.join(", "))
    })
}

fn parse_mode(raw: &str) -> Result<ResizeMode, String> {
    ResizeMode::from_form_value(raw).ok_or_else(|| format!("unknown resize mode `{raw}`"))
}

fn parse_format(raw: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_form_value(raw).ok_or_else(|| format!("unknown output format `{raw}`"))
}

fn parse_scale(raw: &str) -> Result<ScaleFactor, String> {
    raw.trim()
        .trim_end_matches(['x', 'X'])
        .parse::<u32>()
        .ok()
        .and_then(ScaleFactor::from_factor)
        .ok_or_else(|| format!("scale must be 2, 4 or 8, got `{raw}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_command_parses_manual_fields_and_aspect() {
        let cli = Cli::try_parse_from([
            "pixelmagic", "crop", "in.png", "--x", "10", "--width", "200", "--aspect", "16:9",
        ])
        .expect("crop args should parse");
        let Command::Crop(args) = cli.command else {
            panic!("expected crop command");
        };
        assert_eq!(args.x.as_deref(), Some("10"));
        assert_eq!(args.aspect, AspectPreset::Ratio16x9);
        assert!(args.has_manual_fields());
    }

    #[test]
    fn upscale_scale_accepts_suffix_and_rejects_other_values() {
        let cli = Cli::try_parse_from(["pixelmagic", "upscale", "in.png", "--scale", "4x"])
            .expect("4x should parse");
        let Command::Upscale(args) = cli.command else {
            panic!("expected upscale command");
        };
        assert_eq!(args.scale, ScaleFactor::X4);

        assert!(Cli::try_parse_from(["pixelmagic", "upscale", "in.png", "--scale", "3"]).is_err());
    }

    #[test]
    fn resize_defaults_match_form_defaults() {
        let cli = Cli::try_parse_from(["pixelmagic", "-v", "resize", "in.jpg", "--width", "640"])
            .expect("resize args should parse");
        assert_eq!(cli.verbose, 1);
        let Command::Resize(args) = cli.command else {
            panic!("expected resize command");
        };
        assert_eq!(args.mode, ResizeMode::Fit);
        assert_eq!(args.format, OutputFormat::Png);
        assert_eq!(args.quality, 90);
        assert_eq!(args.height, None);
    }

    #[test]
    fn remove_bg_background_must_be_hex() {
        let cli = Cli::try_parse_from([
            "pixelmagic",
            "remove-bg",
            "in.png",
            "--background",
            "#00ff00",
        ])
        .expect("hex color should parse");
        let Command::RemoveBg(args) = cli.command else {
            panic!("expected remove-bg command");
        };
        assert_eq!(args.background, Some(Color::new(0, 255, 0)));
        assert!(
            Cli::try_parse_from(["pixelmagic", "remove-bg", "in.png", "--background", "green"])
                .is_err()
        );
    }
}
