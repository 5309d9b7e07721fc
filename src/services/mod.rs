pub mod catalogue;
pub mod engine;
pub mod similarity;
pub mod state;
pub mod strategies;

pub use catalogue::{CatalogueCache, CatalogueSnapshot};
pub use engine::RecommendationEngine;
pub use state::UserStateStore;
