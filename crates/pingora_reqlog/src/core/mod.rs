pub mod handler;
pub mod request;
pub mod response;

pub use handler::{Handler, HandlerFn};
pub use http::Method; // Use standard HTTP Method
pub use request::{FORWARDED_FOR_HEADER, Request};
pub use response::Response;
