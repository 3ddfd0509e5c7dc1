pub mod camera;
pub mod compressor;
pub mod exporter;
pub mod postgres;
