use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use cartcast::{ArtifactSpec, ArtifactStore, Predictor, PredictorError};

/// Predict the product category a user will most likely add to cart.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Category id of the last viewed item
    #[arg(long)]
    last_view_cat: String,

    /// Most frequently viewed category id
    #[arg(long)]
    most_freq_cat: String,

    /// Number of unique categories viewed
    #[arg(long, default_value_t = 3)]
    unique_cats_viewed: u32,

    /// Total views before the add-to-cart event
    #[arg(long, default_value_t = 5)]
    total_views_before_cart: u32,

    /// Path to the ONNX model file (alternative to --manifest)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Path to the encoders JSON file (alternative to --manifest)
    #[arg(long)]
    encoders: Option<PathBuf>,

    /// Path to an artifact manifest; artifacts are fetched into the local
    /// cache and verified by hash
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Force a fresh download of the artifact files
    #[arg(short, long)]
    fresh: bool,
}

async fn resolve_artifacts(args: &Args) -> Result<(PathBuf, PathBuf)> {
    if let Some(manifest) = &args.manifest {
        let spec = ArtifactSpec::from_json_file(manifest)
            .with_context(|| format!("failed to load manifest {:?}", manifest))?;
        let store = ArtifactStore::new_default()?;

        if args.fresh {
            info!("Fresh download requested - removing any existing artifact files...");
            store.remove_download(&spec.name)?;
        }
        store.ensure_downloaded(&spec).await?;

        return Ok((store.model_path(&spec.name), store.encoders_path(&spec.name)));
    }

    match (&args.model, &args.encoders) {
        (Some(model), Some(encoders)) => Ok((model.clone(), encoders.clone())),
        _ => bail!("Provide either --manifest or both --model and --encoders"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let (model_path, encoders_path) = resolve_artifacts(&args).await?;

    info!("Building predictor...");
    let predictor = Predictor::builder()
        .with_encoders_file(&encoders_path)?
        .with_model_file(&model_path)?
        .build()?;

    let info = predictor.info();
    info!(
        "Predictor ready: {} target categories, feature order {:?}",
        info.num_classes, info.feature_columns
    );

    match predictor.predict(
        &args.last_view_cat,
        &args.most_freq_cat,
        args.unique_cats_viewed,
        args.total_views_before_cart,
    ) {
        Ok((category, top3)) => {
            println!("Predicted category: {}", category);
            println!("Top 3 predictions:");
            for (label, probability) in top3 {
                println!("  {}: {}", label, probability);
            }
            Ok(())
        }
        Err(e @ PredictorError::UnknownCategory { .. }) => {
            eprintln!("\n{}", e);
            eprintln!("Only category ids seen during training can be scored.");
            Err(e.into())
        }
        Err(e) => Err(e).context("failed to produce prediction"),
    }
}
