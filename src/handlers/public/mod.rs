mod reset;
mod signin;

pub use reset::{reset_complete, reset_request, reset_validate_key};
pub use signin::signin;
