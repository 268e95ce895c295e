mod schema;

pub use schema::{Config, FeaturesConfig, OpenAiConfig};
