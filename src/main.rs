// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/unjpeg

//! Command-line front-end: decode each JPEG argument to a BMP next to it.

use std::fs;
use std::path::Path;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("Usage: unjpeg <input.jpg> [more.jpg ...]");
        std::process::exit(1);
    }

    for path in &args {
        if let Err(e) = convert(path) {
            eprintln!("{path}: {e}");
        }
    }
}

fn convert(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(path)?;
    let image = unjpeg::decode(&data)?;
    let out_path = Path::new(path).with_extension("bmp");
    fs::write(&out_path, unjpeg::bmp::encode_bmp(&image))?;
    println!("{} -> {}", path, out_path.display());
    Ok(())
}
