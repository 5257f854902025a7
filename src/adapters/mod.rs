// Adapters - External system implementations

pub mod decode_libav;
pub mod encode_libav;
pub mod probe_libav;
pub mod toml_config;

// Re-export adapters
pub use decode_libav::{LibavDecoderAdapter, LibavUnit};
pub use encode_libav::LibavSinkAdapter;
pub use probe_libav::ProbeLibavAdapter;
pub use toml_config::TomlConfigAdapter;
