// Colour domain — deficiency modes, matrices, and the daltonization engine.

pub mod deficiency;
pub mod engine;
pub mod error;
pub mod matrix;
