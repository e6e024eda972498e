use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "digit-recognizer")]
#[command(about = "Classify hand drawn digits with a pretrained model", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the drawing page and the prediction endpoint
    Serve {
        /// JSON server configuration, the other flags override its fields
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Trained model record (.mpk)
        #[arg(short, long, env = "DIGIT_MODEL")]
        model: Option<String>,

        /// IP address to bind
        #[arg(long, env = "DIGIT_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "DIGIT_PORT")]
        port: Option<u16>,
    },

    /// Classify a PNG file with a trained model
    Predict {
        /// Trained model record (.mpk)
        #[arg(short, long, env = "DIGIT_MODEL")]
        model: String,

        /// Image to classify
        image: PathBuf,
    },
}
