// MIDI similarity analysis

pub mod embedding;
pub mod features;
pub mod reduction;
pub mod scoring;

pub use embedding::*;
pub use features::*;
pub use reduction::*;
pub use scoring::*;
