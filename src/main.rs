//! qrforge command-line entrypoint

use clap::{ArgGroup, Parser};
use qrforge::capacity::{CapacityReport, Emphasis};
use qrforge::qr::{self, RenderOutcome};
use qrforge::{
    Color, Error, ErrorCorrection, PayloadInput, QrForgeConfig, Result, Session, UploadChain,
    UploadResult, logging,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "qrforge",
    version,
    about = "Generate QR codes, offloading large payloads to an anonymous file host"
)]
#[command(group(ArgGroup::new("input").required(true).args(["url", "text", "text_file"])))]
struct Cli {
    /// Encode a URL
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Encode free text
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,

    /// Encode the contents of a text file
    #[arg(long, value_name = "PATH")]
    text_file: Option<PathBuf>,

    /// QR edge in pixels (128-512)
    #[arg(long, value_name = "PX")]
    size: Option<u32>,

    /// Foreground color (#rrggbb)
    #[arg(long, value_name = "HEX")]
    fg: Option<Color>,

    /// Background color (#rrggbb)
    #[arg(long, value_name = "HEX")]
    bg: Option<Color>,

    /// Error correction level (L, M, Q, H)
    #[arg(long, value_name = "LEVEL")]
    level: Option<ErrorCorrection>,

    /// Upload the payload when it is too large for a reliable QR code
    #[arg(long)]
    upload: bool,

    /// Upload the payload regardless of its size
    #[arg(long)]
    force_upload: bool,

    /// Output PNG path (defaults to the configured file name in cwd)
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Decode the exported PNG and check it matches the encoded payload
    #[arg(long)]
    verify: bool,

    /// Print a JSON summary instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Optional configuration file (toml/yaml). Defaults to qrforge.{toml,yaml} in cwd/XDG config.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the per-request upload timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = QrForgeConfig::load(cli.config.as_deref())?;

    if let Some(size) = cli.size {
        config.style = config.style.with_size(size);
    }
    if let Some(fg) = cli.fg {
        config.style.foreground = fg;
    }
    if let Some(bg) = cli.bg {
        config.style.background = bg;
    }
    if let Some(level) = cli.level {
        config.style.error_correction = level;
    }
    if let Some(timeout) = cli.timeout {
        config.upload.timeout_secs = timeout.max(1);
    }

    logging::init(&config.logging)?;

    let input = read_input(&cli)?;
    let mut session = Session::new(config.style);
    session.set_input(input);

    let report = session.input_capacity();
    info!(
        char_count = report.char_count,
        status = ?report.status,
        "Classified input"
    );

    let mut uploaded: Option<UploadResult> = None;
    let wants_upload = cli.force_upload || (cli.upload && report.upload_recommended());
    if wants_upload {
        let chain = UploadChain::from_options(&config.upload)?;
        if !cli.json {
            eprintln!("Uploading via {}...", chain.service_names().join(" → "));
        }
        uploaded = Some(session.upload_with(&chain).await?);
    }

    let resolved_len = session.payload_capacity().char_count;
    let outcome = session.render();
    if !outcome.is_ready() {
        let err = failure_error(outcome, resolved_len);
        let message = describe_failure(&err);
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "error": message }))?
            );
        } else {
            eprintln!("{message}");
        }
        return Err(err);
    }

    let png = session.export()?;
    let path = write_output(&png, cli.output.as_deref(), &config.export.filename)?;

    let verified = if cli.verify {
        let decoded = qr::decode_bytes(&png)?;
        if decoded != session.resolved_payload() {
            return Err(Error::QrDecode(
                "Exported image does not decode to the encoded payload".to_string(),
            ));
        }
        Some(true)
    } else {
        None
    };

    emit_summary(&cli, &session, &report, uploaded.as_ref(), &path, verified)
}

fn read_input(cli: &Cli) -> Result<PayloadInput> {
    if let Some(url) = &cli.url {
        let input = PayloadInput::url(url.clone());
        if !input.looks_like_url() {
            tracing::warn!(url = %url, "Input does not parse as a URL, encoding as given");
        }
        return Ok(input);
    }
    if let Some(text) = &cli.text {
        return Ok(PayloadInput::text(text.clone()));
    }
    if let Some(path) = &cli.text_file {
        let contents = std::fs::read_to_string(path)?;
        return Ok(PayloadInput::text(contents));
    }
    Err(Error::EmptyPayload)
}

fn describe_failure(err: &Error) -> String {
    if !err.is_capacity_related() {
        return err.to_string();
    }
    let hint = match err {
        Error::CapacityExceeded { .. } => {
            "The content is too big for a QR code; shorten it or use --upload."
        }
        _ => "Try a lower error correction level.",
    };
    format!("{}. {hint}", qr::render::FAILURE_MESSAGE)
}

fn failure_error(outcome: &RenderOutcome, char_count: usize) -> Error {
    match outcome.clone().into_result(char_count) {
        Err(err) => err,
        Ok(_) => Error::Other("render succeeded".to_string()),
    }
}

fn write_output(png: &[u8], output: Option<&Path>, default_name: &str) -> Result<PathBuf> {
    match output {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new(""));
            let name = path.file_name().and_then(|n| n.to_str());
            qr::save_png(png, dir, name)
        }
        None => qr::save_png(png, Path::new(""), Some(default_name)),
    }
}

fn emit_summary(
    cli: &Cli,
    session: &Session,
    report: &CapacityReport,
    uploaded: Option<&UploadResult>,
    path: &Path,
    verified: Option<bool>,
) -> Result<()> {
    let style = session.style();
    if cli.json {
        let summary = json!({
            "input": {
                "kind": session.input().kind,
                "char_count": report.char_count,
                "status": report.status,
                "ratio": report.ratio(),
            },
            "upload": uploaded,
            "payload": session.resolved_payload(),
            "style": style,
            "output": path.display().to_string(),
            "verified": verified,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    match report.emphasis() {
        Emphasis::Normal => {}
        Emphasis::Elevated => println!("{}", report.label()),
        Emphasis::Critical if uploaded.is_none() => {
            println!("{} (pass --upload to encode a link instead)", report.label())
        }
        Emphasis::Critical => println!("{}", report.label()),
    }
    if let Some(result) = uploaded {
        println!("Uploaded via {}: {}", result.service_name, result.link);
        println!("Note: links expire after some time based on the host.");
    }
    println!(
        "Saved {} ({}px, level {}, {} on {})",
        path.display(),
        style.size,
        style.error_correction,
        style.foreground,
        style.background
    );
    if verified == Some(true) {
        println!("Verified: exported image decodes to the encoded payload");
    }
    Ok(())
}
