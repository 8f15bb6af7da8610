pub mod fs;
pub mod strategies;

pub use fs::{create_dir, create_file};
pub use scopeguard::defer;
