//! PNG export with embedded metadata (tEXt chunks).

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use mandelgrid_render::{RenderBuffer, RenderConfig};

use crate::error::Result;

const SOFTWARE: &str = "mandelgrid";

/// What was rendered, embedded in the PNG so an image can be reproduced.
#[derive(Debug, Clone)]
pub struct ExportMetadata {
    pub min_re: f64,
    pub min_im: f64,
    pub max_re: f64,
    pub max_im: f64,
    pub max_iterations: u32,
    pub inside: String,
    pub gradient: Vec<String>,
    pub width: u32,
    pub height: u32,
}

impl ExportMetadata {
    pub fn from_config(config: &RenderConfig) -> Self {
        let bounds = config.viewport.bounds();
        Self {
            min_re: bounds.min_re,
            min_im: bounds.min_im,
            max_re: bounds.max_re,
            max_im: bounds.max_im,
            max_iterations: config.max_iterations,
            inside: config.inside_color.to_string(),
            gradient: config.gradient.iter().map(ToString::to_string).collect(),
            width: config.viewport.full_width(),
            height: config.viewport.full_height(),
        }
    }
}

/// Write an RGBA buffer as a PNG file with `metadata` as tEXt chunks.
pub fn export_png(image: &RenderBuffer, path: &Path, metadata: &ExportMetadata) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);

    let mut encoder = png::Encoder::new(writer, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), SOFTWARE.to_string())?;
    encoder.add_text_chunk("Description".to_string(), build_description(metadata))?;
    for (key, value) in build_metadata_pairs(metadata) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image.pixels)?;
    png_writer.finish()?;

    debug!(
        "Exported PNG {}x{} to {}",
        image.width,
        image.height,
        path.display()
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    format!(
        "Mandelbrot set - Re [{}, {}], Im [{}, {}], Iterations: {}",
        meta.min_re, meta.max_re, meta.min_im, meta.max_im, meta.max_iterations,
    )
}

fn build_metadata_pairs(meta: &ExportMetadata) -> Vec<(String, String)> {
    vec![
        ("mandelgrid.MinRe".into(), meta.min_re.to_string()),
        ("mandelgrid.MinIm".into(), meta.min_im.to_string()),
        ("mandelgrid.MaxRe".into(), meta.max_re.to_string()),
        ("mandelgrid.MaxIm".into(), meta.max_im.to_string()),
        ("mandelgrid.MaxIterations".into(), meta.max_iterations.to_string()),
        ("mandelgrid.Inside".into(), meta.inside.clone()),
        ("mandelgrid.Gradient".into(), meta.gradient.join(",")),
        (
            "mandelgrid.Resolution".into(),
            format!("{}x{}", meta.width, meta.height),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandelgrid_core::{ComplexViewport, PlaneBounds};
    use mandelgrid_render::Rgb;

    fn metadata() -> ExportMetadata {
        ExportMetadata::from_config(&RenderConfig {
            viewport: ComplexViewport::new(PlaneBounds::DEFAULT, 4, 4).unwrap(),
            max_iterations: 256,
            inside_color: Rgb::BLACK,
            gradient: vec![Rgb::new(255, 0, 60), Rgb::WHITE],
        })
    }

    #[test]
    fn metadata_reflects_config() {
        let meta = metadata();
        assert_eq!(meta.min_re, -1.5);
        assert_eq!(meta.max_im, 1.5);
        assert_eq!(meta.gradient, vec!["#ff003c", "#ffffff"]);
        assert_eq!((meta.width, meta.height), (4, 4));
    }

    #[test]
    fn export_embeds_text_chunks() {
        let image = RenderBuffer::filled(4, 4, Rgb::new(128, 128, 128));
        let dir = std::env::temp_dir().join("mandelgrid_test_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_export.png");
        export_png(&image, &path, &metadata()).expect("export should succeed");

        let decoder = png::Decoder::new(File::open(&path).expect("file should exist"));
        let mut reader = decoder.read_info().expect("should read info");
        let info = reader.info();
        assert_eq!((info.width, info.height), (4, 4));
        let texts = &info.uncompressed_latin1_text;
        assert!(texts
            .iter()
            .any(|t| t.keyword == "Software" && t.text == SOFTWARE));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "mandelgrid.MaxIterations" && t.text == "256"));
        assert!(texts
            .iter()
            .any(|t| t.keyword == "mandelgrid.Gradient" && t.text == "#ff003c,#ffffff"));

        let mut pixels = vec![0u8; reader.output_buffer_size()];
        reader.next_frame(&mut pixels).expect("should decode");
        assert_eq!(&pixels[..4], &[128, 128, 128, 255]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
