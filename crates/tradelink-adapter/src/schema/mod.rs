/*
[INPUT]:  Endpoint shape declarations and JSON values
[OUTPUT]: Endpoint descriptors and structural validation results
[POS]:    Schema layer - registry + validator shared by the API wrappers
[UPDATE]: When adding endpoints or schema kinds
*/

pub mod registry;
pub mod types;
pub mod validator;

pub use registry::{EndpointDescriptor, SchemaRegistry};
pub use types::{Field, Schema};
pub use validator::{ValidationError, validate, validate_request, validate_response};
