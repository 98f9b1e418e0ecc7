pub mod gltf;

pub use gltf::{load_model, load_model_slice};
