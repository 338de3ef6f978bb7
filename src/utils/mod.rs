pub mod cors;
pub mod response;
pub mod sanitize;
