pub mod codec;
pub mod feed;
pub mod models;
pub mod photos;
pub mod ports;
