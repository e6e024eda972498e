use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use digit_recognizer::{
    cli::{Cli, Commands},
    config::ServerConfig,
    error::{Error, Result},
    inference::{classify_image, Classifier},
    logging::init_logging,
    model::DigitClassifierConfig,
    state::{build_and_load_model, Backend},
    web,
    worker::InferencePool,
};

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve {
            config,
            model,
            host,
            port,
        } => serve(config, model, host, port).await,
        Commands::Predict { model, image } => predict(&model, &image),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(
    config: Option<PathBuf>,
    model: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config = match (config, model) {
        (Some(path), model) => {
            let mut config = ServerConfig::from_file(path)?;
            if let Some(model) = model {
                config.model_path = model;
            }
            config
        }
        (None, Some(model)) => ServerConfig::new(model),
        (None, None) => {
            return Err(Error::Config(
                "no model given, use --model or a configuration file".to_string(),
            ))
        }
    };
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let classifier = load_classifier(&config.model, Path::new(&config.model_path))?;
    let pool = InferencePool::start(classifier, config.workers)?;
    web::serve(pool, &config).await
}

fn predict(model: &str, image: &Path) -> Result<()> {
    let classifier = load_classifier(&DigitClassifierConfig::new(), Path::new(model))?;
    let bytes = std::fs::read(image)?;

    let label = classify_image(&classifier, &bytes)?;
    println!("{label}");

    Ok(())
}

fn load_classifier(config: &DigitClassifierConfig, path: &Path) -> Result<Classifier<Backend>> {
    let device = Default::default();
    let model = build_and_load_model::<Backend>(config, path, &device)?;

    Ok(Classifier::new(model, device))
}
