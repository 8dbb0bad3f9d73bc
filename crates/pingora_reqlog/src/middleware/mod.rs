#![allow(clippy::module_inception)]
pub mod middleware;
pub mod request_id_middleware;

pub use middleware::{Middleware, compose};
pub use request_id_middleware::{REQUEST_ID_HEADER, RequestId};
