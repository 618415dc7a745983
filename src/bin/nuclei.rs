use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use nucleus_counter::detect::{DetectConfig, Polarity, detect_centers, grayscale};
use nucleus_counter::export::points_to_csv;
use nucleus_counter::features;
use nucleus_counter::feedback::{Correction, FeedbackSink};
use nucleus_counter::loader;
use nucleus_counter::recommend::{DEFAULT_K, ParamStore};
use nucleus_counter::render::draw_markers;
use nucleus_counter::types::{DetectionParameters, PartialParams};

#[derive(Parser, Debug)]
#[command(
    name = "nuclei",
    about = "Detect cell-nucleus centers in a microscopy image",
    version
)]
struct Cli {
    /// Input image (png, jpg, jpeg, tif, tiff)
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Directory holding feedback.json and params.json
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Minimum contour area in pixels; overrides any store suggestion
    #[arg(long = "min-area")]
    min_area: Option<u32>,

    /// Neighbor count for the parameter recommendation
    #[arg(long = "k", default_value_t = DEFAULT_K)]
    k: usize,

    /// Write the final point list as CSV
    #[arg(long = "csv")]
    csv: Option<PathBuf>,

    /// Write an annotated overlay PNG
    #[arg(long = "overlay")]
    overlay: Option<PathBuf>,

    /// Skip adaptive contrast enhancement
    #[arg(long = "no-clahe")]
    no_clahe: bool,

    /// Skip watershed splitting of touching nuclei
    #[arg(long = "no-watershed")]
    no_watershed: bool,

    /// Foreground polarity: auto, bright, or dark
    #[arg(long = "polarity", default_value = "auto")]
    polarity: String,

    /// Watershed seed threshold as a fraction of the distance maximum
    #[arg(long = "seed-fraction", default_value_t = 0.5)]
    seed_fraction: f32,

    /// Record this run into the feedback and parameter stores
    #[arg(long = "save-feedback")]
    save_feedback: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !loader::is_supported_extension(&cli.image) {
        return Err(format!(
            "unsupported file type: {} (expected png, jpg, jpeg, tif, tiff)",
            cli.image.display()
        )
        .into());
    }
    let bytes = fs::read(&cli.image)?;
    let rgb = loader::load_rgb(&bytes)?;

    let gray = grayscale(&rgb)?;
    let feats = features::extract(&gray);
    let (height, width) = feats.shape;
    eprintln!(
        "{}: {width}x{height}, contrast {:.2}, mean {:.2}",
        cli.image.display(),
        feats.contrast,
        feats.mean_intensity
    );

    let suggestion = match &cli.data_dir {
        Some(dir) => {
            let store = ParamStore::open(dir.join("params.json"));
            let suggested = store.suggest(&feats, cli.k)?;
            if suggested.is_some() {
                eprintln!("using parameter suggestion from {} neighbors", cli.k);
            }
            suggested
        }
        None => None,
    };
    let overrides = PartialParams {
        min_area: cli.min_area,
        ..Default::default()
    };
    let params = DetectionParameters::resolved(suggestion.as_ref(), &overrides);

    let config = DetectConfig {
        min_area: params.min_area,
        use_clahe: !cli.no_clahe,
        use_watershed: !cli.no_watershed,
        polarity: match cli.polarity.as_str() {
            "auto" => Polarity::Auto,
            "bright" => Polarity::Bright,
            "dark" => Polarity::Dark,
            other => return Err(format!("unknown polarity: {other}").into()),
        },
        seed_fraction: cli.seed_fraction,
        ..Default::default()
    };

    let centers = detect_centers(&rgb, &config)?;
    println!("{} nuclei detected", centers.len());

    if let Some(csv_path) = &cli.csv {
        fs::write(csv_path, points_to_csv(&centers))?;
        eprintln!("wrote {}", csv_path.display());
    }

    if let Some(overlay_path) = &cli.overlay {
        let mut canvas = rgb.clone();
        draw_markers(
            &mut canvas,
            &centers,
            params.marker_radius,
            params.line_thickness,
            params.color,
            1.0,
        );
        canvas.save(overlay_path)?;
        eprintln!("wrote {}", overlay_path.display());
    }

    if cli.save_feedback {
        let Some(dir) = &cli.data_dir else {
            return Err("--save-feedback requires --data-dir".into());
        };
        let sink = FeedbackSink::open(dir.join("feedback.json"), dir.join("params.json"));
        let image_name = cli
            .image
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("uploaded_image");
        let record = sink.commit(&Correction {
            image_name,
            features: feats,
            params_used: params,
            auto_points: &centers,
            added_points: &[],
            removed_points: &[],
            final_points: &centers,
            label: "",
        })?;
        eprintln!("saved feedback ({} final points)", record.final_count);
    }

    Ok(())
}
