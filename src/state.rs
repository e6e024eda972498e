use std::path::Path;

use burn::{
    module::Module,
    record::{FullPrecisionSettings, NamedMpkFileRecorder},
};

use crate::error::{Error, Result};
use crate::model::{DigitClassifier, DigitClassifierConfig};

#[cfg(feature = "wgpu")]
pub type Backend = burn::backend::Wgpu<f32, i32>;

#[cfg(all(feature = "ndarray", not(feature = "wgpu")))]
pub type Backend = burn::backend::ndarray::NdArray<f32>;

/// Recorder used for model artifacts: named MessagePack at full precision.
pub type ArtifactRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Builds the model described by `config` and loads the trained parameters stored at `path`.
///
/// The recorder appends the `.mpk` extension, so `model` and `model.mpk` point to the
/// same artifact.
pub fn build_and_load_model<B: burn::prelude::Backend>(
    config: &DigitClassifierConfig,
    path: &Path,
    device: &B::Device,
) -> Result<DigitClassifier<B>> {
    let artifact = path.with_extension("mpk");
    if !artifact.is_file() {
        return Err(Error::ModelLoad {
            path: artifact,
            reason: "file does not exist".to_string(),
        });
    }

    log::info!("Loading model weights from {}", artifact.display());

    config
        .init::<B>(device)
        .load_file(path.to_path_buf(), &ArtifactRecorder::new(), device)
        .map_err(|err| Error::ModelLoad {
            path: artifact,
            reason: err.to_string(),
        })
}
