//! badgeprint CLI
//!
//! Usage:
//!   badgeprint --template <FILE> --attendee <FILE> --event <FILE> [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>     TOML config (fonts, asset root, defaults)
//!   -f, --format <FORMAT>   pdf or png
//!       --dpi <DPI>         Raster density
//!       --assets <DIR>      Root directory for local asset references
//!       --event-id <ID>     Pick the active template when the file holds several
//!   -o, --output <FILE>     Output path, `-` for stdout
//!   -v, --verbose           Raise log level (repeatable)

mod config;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use badge_render::{
    compose, select_active, AttendeeRecord, BadgeTemplate, EventRecord, OutputFormat, RenderContext, RenderOptions,
    RoutedAssets,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use config::Config;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Pdf => OutputFormat::Pdf,
            FormatArg::Png => OutputFormat::Png,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "badgeprint")]
#[command(about = "Render event badges at true physical size")]
struct Cli {
    /// Template JSON (one template or an array of templates)
    #[arg(short, long)]
    template: PathBuf,

    /// Attendee JSON
    #[arg(short, long)]
    attendee: PathBuf,

    /// Event JSON
    #[arg(short, long)]
    event: PathBuf,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Raster density in dots per inch
    #[arg(long)]
    dpi: Option<u32>,

    /// Root directory for local asset references
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Asset fetch timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Event id used to select the active template from an array
    #[arg(long)]
    event_id: Option<u64>,

    /// Output path, `-` writes to stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Raise log level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {what} '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {what} '{}'", path.display()))
}

/// Load the template file, selecting the active one when it holds an array
fn load_template(path: &Path, event_id: Option<u64>, category: &str) -> Result<BadgeTemplate> {
    let content = fs::read_to_string(path).with_context(|| format!("reading template '{}'", path.display()))?;

    if !content.trim_start().starts_with('[') {
        return BadgeTemplate::from_json(&content).with_context(|| format!("parsing template '{}'", path.display()));
    }

    let raw: Vec<serde_json::Value> =
        serde_json::from_str(&content).with_context(|| format!("parsing templates '{}'", path.display()))?;
    let templates = raw
        .iter()
        .map(|value| BadgeTemplate::from_json(&value.to_string()))
        .collect::<badge_render::Result<Vec<_>>>()?;

    let Some(event_id) = event_id else {
        bail!("'{}' holds several templates, pass --event-id", path.display());
    };
    Ok(select_active(&templates, event_id, category)?.clone())
}

fn build_options(cli: &Cli, config: &Config) -> Result<RenderOptions> {
    let mut options = RenderOptions::default();
    if let Some(format) = cli.format.map(OutputFormat::from).or(config.format) {
        options.format = format;
    }
    if let Some(dpi) = cli.dpi.or(config.dpi) {
        options.dpi = dpi;
    }
    if let Some(timeout) = cli.timeout_ms.or(config.asset_timeout_ms) {
        options.asset_timeout_ms = timeout;
    }
    if let Some(factor) = config.line_height_factor {
        options.line_height_factor = factor;
    }
    Ok(options.with_fonts(config.load_fonts()?))
}

fn default_output(attendee: &AttendeeRecord, format: OutputFormat) -> PathBuf {
    let stem = if attendee.qr_uuid.is_empty() {
        "badge".to_string()
    } else {
        format!("badge-{}", attendee.qr_uuid)
    };
    PathBuf::from(format!("{stem}.{}", format.extension()))
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let attendee: AttendeeRecord = read_json(&cli.attendee, "attendee")?;
    let event: EventRecord = read_json(&cli.event, "event")?;
    let template = load_template(&cli.template, cli.event_id, &attendee.category)?;
    let options = build_options(&cli, &config)?;

    let mut assets = RoutedAssets::new().with_http();
    if let Some(root) = cli.assets.clone().or_else(|| config.assets.clone()) {
        assets = assets.with_directory(root);
    }

    let ctx = RenderContext::new(&attendee, &event, &template, &assets);
    let document = compose(&ctx, &options)?;

    for failure in &document.skipped {
        warn!("element '{}' left blank: {}", failure.element_id, failure.error);
    }

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output(&attendee, options.format));
    if output == Path::new("-") {
        io::stdout().write_all(&document.bytes).context("writing to stdout")?;
    } else {
        fs::write(&output, &document.bytes).with_context(|| format!("writing '{}'", output.display()))?;
        info!(
            "wrote {} ({} bytes, {} x {} cm)",
            output.display(),
            document.bytes.len(),
            document.page_size.width_cm,
            document.page_size.height_cm
        );
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_flags_override_config() {
        let cli = parse(&[
            "badgeprint", "-t", "t.json", "-a", "a.json", "-e", "e.json", "--format", "png", "--dpi", "150",
        ]);
        let config = Config {
            format: Some(OutputFormat::Pdf),
            dpi: Some(600),
            asset_timeout_ms: Some(2000),
            ..Default::default()
        };

        let options = build_options(&cli, &config).unwrap();
        assert_eq!(options.format, OutputFormat::Png);
        assert_eq!(options.dpi, 150);
        assert_eq!(options.asset_timeout_ms, 2000);
    }

    #[test]
    fn test_verbose_is_counted() {
        let cli = parse(&["badgeprint", "-t", "t", "-a", "a", "-e", "e", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_default_output_name() {
        let attendee = AttendeeRecord {
            qr_uuid: "abc".to_string(),
            ..Default::default()
        };
        assert_eq!(default_output(&attendee, OutputFormat::Png), PathBuf::from("badge-abc.png"));
        assert_eq!(
            default_output(&AttendeeRecord::default(), OutputFormat::Pdf),
            PathBuf::from("badge.pdf")
        );
    }

    #[test]
    fn test_template_array_needs_event_id() {
        let path = std::env::temp_dir().join(format!("badgeprint-templates-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"[
                { "eventId": 7, "category": "guest", "elements": [] },
                { "eventId": 7, "category": "exhibitor", "badgeWidthCm": 9, "elements": [] }
            ]"#,
        )
        .unwrap();

        assert!(load_template(&path, None, "exhibitor").is_err());
        let template = load_template(&path, Some(7), "Exhibitor").unwrap();
        assert_eq!(template.badge_width_cm, Some(9.0));

        fs::remove_file(&path).unwrap();
    }
}
