pub mod http;

pub use http::{Route, error_response, handle_http_request, request_target, route_request};
