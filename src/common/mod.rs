mod api;
pub use api::*;

mod backends;
pub use backends::*;
