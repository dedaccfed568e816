mod cli;

use std::sync::Arc;

use anpr_rs::config::AnprConfig;
use anpr_rs::pipeline::{AnprPipeline, PipelineOptions};
use anpr_rs::plate_rules::normalize_plate;
use anpr_rs::report::{build_report, collect_images};
use anpr_rs::server::{self, AppState};
use anpr_vision::{CommandDetector, CommandReader, ContrastCropper};
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Commands, EngineArgs};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn apply_engine_args(config: &mut AnprConfig, engine: &EngineArgs) {
  if let Some(model) = &engine.model {
    config.model_path = model.clone();
  }
  if let Some(debug) = engine.debug {
    config.debug = debug;
  }
  if let Some(gpu) = engine.gpu {
    config.use_gpu = gpu;
  }
  if let Some(cmd) = &engine.detector_cmd {
    config.detector_command = cmd.clone();
  }
  if let Some(cmd) = &engine.ocr_cmd {
    config.ocr_command = cmd.clone();
  }
}

fn build_pipeline(config: &AnprConfig) -> Result<AnprPipeline> {
  let detector = CommandDetector::new(&config.detector_command, &config.model_path, config.use_gpu)
    .context("Failed to initialize plate detector")?;
  let reader = CommandReader::new(&config.ocr_command, config.use_gpu)
    .context("Failed to initialize OCR reader")?;

  Ok(AnprPipeline::new(
    Arc::new(detector),
    Arc::new(ContrastCropper::new()),
    Arc::new(reader),
    PipelineOptions {
      debug: Some(config.debug),
    },
  ))
}

async fn run(args: Args) -> Result<()> {
  match args.command {
    Commands::Version => {
      println!("anpr {}", env!("CARGO_PKG_VERSION"));
    }
    Commands::Normalize { text } => {
      let plate = normalize_plate(&text);
      if plate.is_empty() {
        anyhow::bail!("No valid plate found in {:?}", text);
      }
      println!("{}", plate);
    }
    Commands::Detect { path, output, engine } => {
      let mut config = AnprConfig::from_env()?;
      apply_engine_args(&mut config, &engine);

      let images = collect_images(&path)?;
      let pipeline = build_pipeline(&config)?;
      let model = config.model_path.display().to_string();

      let report = tokio::task::spawn_blocking(move || build_report(&pipeline, &images, &model))
        .await
        .context("Detection task panicked")??;

      info!(
        images = report.images.len(),
        with_plate = report.total_plates(),
        "detection finished"
      );

      let json = serde_json::to_string_pretty(&report)?;
      match output {
        Some(output) => {
          tokio::fs::write(&output, json)
            .await
            .with_context(|| format!("Failed to write {}", output.display()))?;
        }
        None => println!("{}", json),
      }
    }
    Commands::Serve { host, port, engine } => {
      let mut config = AnprConfig::from_env()?;
      apply_engine_args(&mut config, &engine);
      if let Some(host) = host {
        config.host = host;
      }
      if let Some(port) = port {
        config.port = port;
      }

      let pipeline = build_pipeline(&config)?;

      let state = AppState {
        pipeline: Arc::new(pipeline),
        model: config.model_path.display().to_string(),
      };
      server::serve(&config.host, config.port, state).await?;
    }
  }
  Ok(())
}

#[tokio::main]
async fn main() {
  init_tracing();

  let args = Args::parse();

  if let Err(e) = run(args).await {
    eprintln!("Error: {:#}", e);
    std::process::exit(1);
  }
}
