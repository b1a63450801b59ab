pub mod download;
pub mod index;
pub mod progress;
pub mod upload;

pub use download::download;
pub use index::{health, index};
pub use progress::progress;
pub use upload::upload;
