pub mod merger;
pub mod normalizer;
pub mod resolver;
