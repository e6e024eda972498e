use burn::{
    prelude::*,
    tensor::{activation::softmax, TensorData},
};

use crate::error::{Error, Result};
use crate::label::predict_label;
use crate::model::DigitClassifier;
use crate::preprocess::{data_url_to_input, image_to_input};

/// A loaded model ready to score single images.
///
/// The model is only read during inference. Cloning is cheap: parameters are reference
/// counted tensors.
#[derive(Clone, Debug)]
pub struct Classifier<B: Backend> {
    model: DigitClassifier<B>,
    device: B::Device,
}

impl<B: Backend> Classifier<B> {
    pub fn new(model: DigitClassifier<B>, device: B::Device) -> Self {
        Self { model, device }
    }

    /// Shape the input must have, as declared by the model.
    pub fn input_shape(&self) -> [usize; 4] {
        self.model.input_shape()
    }

    /// Runs the model on one prepared image and returns the class probabilities.
    pub fn infer(&self, input: TensorData) -> Result<Vec<f32>> {
        let expected = self.input_shape();
        if input.shape.as_slice() != expected.as_slice() {
            return Err(Error::Inference(format!(
                "input shape {:?} does not match the model input shape {expected:?}",
                input.shape
            )));
        }

        let input = Tensor::<B, 4>::from_data(input.convert::<B::FloatElem>(), &self.device);
        let output = self.model.forward(input);
        let output = softmax(output, 1);

        let scores = output
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|err| Error::Inference(format!("cannot read model output: {err:?}")))?;

        if scores.len() != self.model.num_classes() {
            return Err(Error::Inference(format!(
                "model returned {} scores for {} classes",
                scores.len(),
                self.model.num_classes()
            )));
        }

        Ok(scores)
    }
}

/// Classifies an encoded image: preprocessing, one forward pass and one label lookup.
pub fn classify_image<B: Backend>(
    classifier: &Classifier<B>,
    bytes: &[u8],
) -> Result<&'static str> {
    let input = image_to_input(bytes, classifier.input_shape())?;
    label_scores(classifier.infer(input)?)
}

/// Same as [classify_image] for an image posted as a base64 data URL.
pub fn classify_data_url<B: Backend>(
    classifier: &Classifier<B>,
    url: &str,
) -> Result<&'static str> {
    let input = data_url_to_input(url, classifier.input_shape())?;
    label_scores(classifier.infer(input)?)
}

fn label_scores(scores: Vec<f32>) -> Result<&'static str> {
    let label = predict_label(&scores)?;
    log::debug!("Predicted {label} from scores {scores:?}");
    Ok(label)
}
