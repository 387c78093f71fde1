//! Creates an icon family from a PNG file of any size, resampling it to every
//! standard icon size.
//!
//! ```shell
//! cargo run --example png2icns <path/to/file.png>
//! # ICNS will be saved to path/to/file.icns
//! ```
//!
//! To generate only some logical sizes, list them after the path:
//!
//! ```shell
//! cargo run --example png2icns <path/to/file.png> 16 32 128
//! ```

use iconfamily::{Bitmap, FastResampler, IconFamily, ThumbnailOptions};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        println!("Usage: png2icns <path> [<size>...]");
        return;
    }
    let mut options = ThumbnailOptions::default();
    if args.len() > 1 {
        options.sizes = match args[1..].iter().map(|s| s.parse()).collect() {
            Ok(sizes) => sizes,
            Err(err) => {
                eprintln!("invalid size: {}", err);
                process::exit(1);
            }
        };
    }
    let png_path = Path::new(&args[0]);
    let png_file = BufReader::new(File::open(png_path)
        .expect("failed to open PNG file"));
    let image = Bitmap::read_png(png_file).expect("failed to read PNG file");
    let family = IconFamily::from_thumbnails(&image, &FastResampler::new(), &options)
        .expect("failed to build icon family");
    let icns_path = png_path.with_extension("icns");
    family.write_to_file(&icns_path).expect("failed to write ICNS file");
    println!("Wrote {} element(s) to {}",
             family.elements().len(),
             icns_path.display());
}
