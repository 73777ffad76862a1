//! OpenAPI to collection transformation
//!
//! [`SpecTransformer`] drives a [`CollectionGenerator`] through the
//! initialize / generate / save sequence. [`PortmanCli`] is the generator used
//! in production.

mod adapter;
mod portman;
mod traits;

pub use adapter::SpecTransformer;
pub use portman::PortmanCli;
pub use traits::{CollectionGenerator, TransformError};
