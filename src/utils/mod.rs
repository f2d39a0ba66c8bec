//! Utility functions and helpers.

pub mod delay;
pub mod http;
pub mod pagination;

pub use delay::{pause, random_delay, type_like_human};
pub use http::wait_for_webdriver;
pub use pagination::{next_page_url, page_url};
