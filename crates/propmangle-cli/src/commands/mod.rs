pub mod mangle;
pub mod version;
