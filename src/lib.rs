//! Web front end classifying digits drawn on a canvas with a pretrained Burn model.
//!
//! A request flows through [preprocess] (data URL to normalized input), [inference]
//! (one forward pass of the model loaded by [state]) and [label] (arg-max to a
//! digit name); [worker] runs them on threads owning a copy of the model and [web]
//! wires the pool behind `POST /predict`.

pub mod cli;
pub mod config;
pub mod error;
pub mod inference;
pub mod label;
pub mod logging;
pub mod model;
pub mod preprocess;
pub mod state;
pub mod web;
pub mod worker;

pub use error::{Error, Result};

#[cfg(test)]
pub(crate) type TestBackend = burn::backend::NdArray<f32>;
