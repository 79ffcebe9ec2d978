//! Outbound adapters: model provider clients and the reference-data source.

pub mod model;
pub mod reference;

pub use model::{build_client, Anthropic, ModelClient, OpenAi};
pub use reference::{HttpReferenceSource, ReferenceSource};
