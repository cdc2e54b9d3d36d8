pub mod normalize;
pub mod rules; // Pattern rule classifier
pub mod generative; // Language-model adapter
pub mod reconcile;
