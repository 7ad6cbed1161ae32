mod loader;
mod probe;

pub use loader::load_from_path;
pub use probe::ProbeConfig;
