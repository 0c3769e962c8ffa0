//! This module holds typed parameters for various endpoint inputs.
//!
//! By using typed parameters, inputs are validated (by type) and correctly
//! formatted before they reach the presence layer. Range checks that serde
//! cannot express live next to each type.

pub(crate) mod notification;
pub(crate) mod realtime;
