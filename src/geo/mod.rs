//! Place name to local time resolution

pub mod maps;
pub mod resolver;

pub use maps::{GoogleMapsClient, LatLng, MapsApi};
pub use resolver::{PlaceTimeResolver, ResolveStage, ResolvedTime};
