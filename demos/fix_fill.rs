use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use clap::{Args, Parser};

use fillfix::{fix_even_odd_to_winding_with, ConvertOptions};

#[derive(Parser)]
struct Cli {
    #[command(flatten)]
    input: Input,

    /// The maximum distance between a curve and its approximation.
    #[arg(long)]
    quality: Option<f64>,

    /// Seconds to spend on each attempt before lowering the quality.
    #[arg(long)]
    timeout: Option<f64>,

    /// Read the remaining options from this YAML file.
    #[arg(long)]
    options: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// Path data, in SVG syntax.
    data: Option<String>,

    /// A file containing path data.
    #[arg(long)]
    file: Option<PathBuf>,
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();

    let data = match (&args.input.data, &args.input.file) {
        (Some(data), _) => data.clone(),
        (None, Some(file)) => std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?,
        (None, None) => unreachable!("clap requires one of the inputs"),
    };

    let mut options = match &args.options {
        Some(path) => serde_yaml::from_str(&std::fs::read_to_string(path)?)
            .with_context(|| format!("parsing {}", path.display()))?,
        None => ConvertOptions::default(),
    };
    if let Some(quality) = args.quality {
        options.quality = quality;
    }
    if let Some(timeout) = args.timeout {
        options.timeout = Duration::from_secs_f64(timeout);
    }

    let path = kurbo::BezPath::from_svg(data.trim())?;
    let conversion = fix_even_odd_to_winding_with(&path, &options)?;

    println!("{}", conversion.path.to_svg());
    if conversion.separate_path_for_stroke {
        println!("stroke with: {}", path.to_svg());
    }
    tracing::info!(
        attempts = conversion.attempts,
        quality = conversion.quality,
        "done"
    );
    Ok(())
}
