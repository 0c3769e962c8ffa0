//! Response DTOs that give presence types an OpenAPI schema.

pub(crate) mod realtime;
