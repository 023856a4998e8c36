pub mod builder;
pub mod domain;
pub mod text;
pub mod vector;

pub use builder::{FeatureBuilder, FeatureOutput};
pub use vector::{FeatureSlot, FeatureVector, FEATURE_COUNT};
