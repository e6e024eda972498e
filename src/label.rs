use crate::error::{Error, Result};

/// Display name of every class, indexed by the model output position.
pub const LABELS: [&str; 10] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

/// Index of the largest score. The first index wins on ties and `NaN` never wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, max)) if score <= max => {}
            _ => best = Some((index, score)),
        }
    }

    // Only NaN scores: fall back to the first class.
    best.map(|(index, _)| index)
        .or_else(|| (!scores.is_empty()).then_some(0))
}

pub fn label_for(index: usize) -> Option<&'static str> {
    LABELS.get(index).copied()
}

/// Label of the highest scoring class.
pub fn predict_label(scores: &[f32]) -> Result<&'static str> {
    let index =
        argmax(scores).ok_or_else(|| Error::Inference("model returned no scores".to_string()))?;

    label_for(index).ok_or_else(|| {
        Error::Inference(format!(
            "class index {index} has no label, only {} are known",
            LABELS.len()
        ))
    })
}
