//! Loading a report from disk and turning it into printable output.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use crate::model::EventReport;
use crate::render::{render_frames, RenderEntry, RenderOptions};
use crate::view::{format_trace, OutputFormat, Platform, ViewState};

/// Everything that controls a single render.
#[derive(Debug, Clone)]
pub struct Config {
    /// Verbosity level (0 = warn, 1 = info, 2 = debug, 3+ = trace)
    pub verbosity: u8,
    /// JSON report to read
    pub input: PathBuf,
    /// Show library/runtime frames too
    pub include_system_frames: bool,
    /// Expand the last app frame with its source context
    pub expand_first_frame: bool,
    /// Print the most recent call first
    pub newest_first: bool,
    /// Platform tag; the report's own platform is used when unset
    pub platform: Option<String>,
    /// Show absolute instead of image-relative addresses
    pub absolute_addresses: bool,
    /// Show full function names instead of abbreviated ones
    pub full_function_names: bool,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            verbosity: 0,
            input: PathBuf::new(),
            include_system_frames: false,
            expand_first_frame: false,
            newest_first: false,
            platform: None,
            absolute_addresses: false,
            full_function_names: false,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Default log filter for the configured verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            include_system_frames: self.include_system_frames,
            expand_first_frame: self.expand_first_frame,
            newest_first: self.newest_first,
        }
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            absolute_addresses: self.absolute_addresses,
            full_function_names: self.full_function_names,
        }
    }

    /// The configured platform, else the report's, else `other`.
    pub fn platform_for(&self, report: &EventReport) -> Platform {
        self.platform
            .as_deref()
            .or(report.platform.as_deref())
            .map_or(Platform::Other, Platform::from_tag)
    }
}

pub fn load_report(path: &Path) -> Result<EventReport> {
    if !path.exists() {
        bail!("Input not found: {}", path.display());
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let report: EventReport = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse report {}", path.display()))?;
    info!(
        "Loaded {} frames and {} images from {}",
        report.stacktrace.frames.len(),
        report.debug_meta.images.len(),
        path.display()
    );
    Ok(report)
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    platform: &'static str,
    icon: &'static str,
    address_width: usize,
    entries: &'a [RenderEntry<'a>],
}

/// Render `report` according to `config`, returning the text to print.
pub fn render_report(report: &EventReport, config: &Config) -> Result<String> {
    let platform = config.platform_for(report);
    let rendered = render_frames(
        &report.stacktrace,
        &report.debug_meta.images,
        &config.render_options(),
    );
    debug!(
        "Rendered {} of {} frames for platform {platform}",
        rendered.frames().count(),
        report.stacktrace.frames.len()
    );

    let out = match config.format {
        OutputFormat::Text => {
            let mut lines = vec![format!("[{}]", platform.icon())];
            lines.extend(format_trace(&rendered, platform, &config.view_state()));
            lines.join("\n")
        }
        OutputFormat::Json => serde_json::to_string_pretty(&JsonOutput {
            platform: platform.as_str(),
            icon: platform.icon(),
            address_width: rendered.address_width,
            entries: &rendered.entries,
        })?,
    };
    Ok(out)
}

/// Load `config.input` and render it.
pub fn stackview(config: &Config) -> Result<String> {
    let report = load_report(&config.input)?;
    render_report(&report, config)
}
