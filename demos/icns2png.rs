//! Decodes one element of an icon family (with its masks applied) to PNG.
//!
//! ```shell
//! cargo run --example icns2png <path/to/file.icns> <ostype>
//! # PNG will be saved to path/to/file.<ostype>.png
//! ```

use iconfamily::{IconFamily, OSType};
use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    if env::args().count() != 3 {
        println!("Usage: icns2png <path> <ostype>");
        return;
    }
    let icns_path = env::args().nth(1).unwrap();
    let icns_path = Path::new(&icns_path);
    let ostype = OSType::from_str(&env::args().nth(2).unwrap()).unwrap();
    let family = IconFamily::read_from_file(icns_path)
        .expect("failed to read ICNS file");
    let image = family.decode_element(ostype)
        .expect("failed to decode image")
        .expect("no element with that OSType found");
    let png_path = icns_path.with_extension(format!("{}.png", ostype));
    let png_file = BufWriter::new(File::create(png_path)
        .expect("failed to create PNG file"));
    image.write_png(png_file).expect("failed to write PNG file");
}
