/*
[INPUT]:  Protocol definitions and serde requirements
[OUTPUT]: Typed Rust structs/enums with serialization support
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When protocol types are added or changed
*/

pub mod enums;
pub mod models;
pub mod requests;
pub(crate) mod serde_helpers;

pub use enums::*;
pub use models::*;
pub use requests::*;
