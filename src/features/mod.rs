pub mod data_url;
pub mod distance;
pub mod error;
pub mod geolocation;
pub mod media;
pub mod simulation;
