//! Render a styled QR code and save it next to the working directory
//!
//! Usage: cargo run --example generate_qr

use qrforge::qr::save_png;
use qrforge::{Color, ErrorCorrection, PayloadInput, Session, StyleParameters};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let style = StyleParameters::default()
        .with_size(320)
        .with_colors(Color::from_hex("#1e1b4b")?, Color::WHITE)
        .with_error_correction(ErrorCorrection::Q);

    let mut session = Session::new(style);
    session.set_input(PayloadInput::url("https://example.com"));

    let report = session.input_capacity();
    println!("{}", report.label());

    session.render();
    let png = session.export()?;
    let path = save_png(&png, Path::new("."), None)?;

    println!("✓ QR code saved to {}", path.display());
    Ok(())
}
