mod backend;
mod geolocation;
mod picker;

pub use backend::{MapBackend, MapId, MapSnapshot, MarkerId, MarkerSpec, MemoryMap, TileLayer};
pub use geolocation::{FixedGeolocation, GeoPosition, GeolocationProvider, PositionOptions};
pub use picker::{LocationCallback, LocationPicker, MapMode, PickerOptions, StoryMarker};
