use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::error::MapError;
use crate::geo::{LatLngBounds, SelectedLocation};

pub type MapId = u64;
pub type MarkerId = u64;

/// Tile source shown under the markers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self {
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: SelectedLocation,
    pub title: String,
    pub draggable: bool,
    pub popup: Option<String>,
}

/// Map/tile rendering library seam.
///
/// Implementations own the actual widgets; user clicks and marker drags are
/// forwarded to [`super::LocationPicker::handle_click`] and
/// [`super::LocationPicker::handle_marker_drag`] by the embedding layer.
pub trait MapBackend: Send + Sync {
    fn create_map(
        &self,
        container: &str,
        center: SelectedLocation,
        zoom: u8,
        tiles: &TileLayer,
    ) -> Result<MapId, MapError>;

    /// Map currently mounted in `container`, whoever created it
    fn map_in_container(&self, container: &str) -> Option<MapId>;

    fn remove_map(&self, map: MapId) -> Result<(), MapError>;

    fn add_marker(&self, map: MapId, marker: MarkerSpec) -> Result<MarkerId, MapError>;

    fn remove_marker(&self, map: MapId, marker: MarkerId) -> Result<(), MapError>;

    fn set_view(&self, map: MapId, center: SelectedLocation, zoom: u8) -> Result<(), MapError>;

    fn zoom(&self, map: MapId) -> Result<u8, MapError>;

    fn fit_bounds(&self, map: MapId, bounds: LatLngBounds) -> Result<(), MapError>;
}

/// Observable state of one in-memory map
#[derive(Debug, Clone, PartialEq)]
pub struct MapSnapshot {
    pub container: String,
    pub center: SelectedLocation,
    pub zoom: u8,
    pub tiles: TileLayer,
    pub markers: Vec<(MarkerId, MarkerSpec)>,
    pub fitted_bounds: Option<LatLngBounds>,
}

#[derive(Debug)]
struct MapInstance {
    container: String,
    center: SelectedLocation,
    zoom: u8,
    tiles: TileLayer,
    markers: BTreeMap<MarkerId, MarkerSpec>,
    fitted_bounds: Option<LatLngBounds>,
}

#[derive(Debug, Default)]
struct MemoryMapState {
    next_id: u64,
    maps: HashMap<MapId, MapInstance>,
    containers: HashMap<String, MapId>,
}

impl MemoryMapState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn instance(&mut self, map: MapId) -> Result<&mut MapInstance, MapError> {
        self.maps.get_mut(&map).ok_or(MapError::UnknownMap(map))
    }
}

/// Headless map backend that keeps markers and views in memory.
///
/// Like browser map libraries it refuses to mount a second map into a
/// container that already hosts one.
#[derive(Debug, Default)]
pub struct MemoryMap {
    state: Mutex<MemoryMapState>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, map: MapId) -> Option<MapSnapshot> {
        let state = self.state.lock();
        state.maps.get(&map).map(|instance| MapSnapshot {
            container: instance.container.clone(),
            center: instance.center,
            zoom: instance.zoom,
            tiles: instance.tiles.clone(),
            markers: instance
                .markers
                .iter()
                .map(|(id, spec)| (*id, spec.clone()))
                .collect(),
            fitted_bounds: instance.fitted_bounds,
        })
    }

    pub fn map_count(&self) -> usize {
        self.state.lock().maps.len()
    }

    pub fn marker_count(&self, map: MapId) -> usize {
        self.state
            .lock()
            .maps
            .get(&map)
            .map(|instance| instance.markers.len())
            .unwrap_or(0)
    }
}

impl MapBackend for MemoryMap {
    fn create_map(
        &self,
        container: &str,
        center: SelectedLocation,
        zoom: u8,
        tiles: &TileLayer,
    ) -> Result<MapId, MapError> {
        let mut state = self.state.lock();
        if state.containers.contains_key(container) {
            return Err(MapError::Backend(format!(
                "Map container '{}' is already initialized",
                container
            )));
        }

        let id = state.allocate_id();
        state.maps.insert(
            id,
            MapInstance {
                container: container.to_string(),
                center,
                zoom,
                tiles: tiles.clone(),
                markers: BTreeMap::new(),
                fitted_bounds: None,
            },
        );
        state.containers.insert(container.to_string(), id);

        debug!("Created map {} in container '{}'", id, container);
        Ok(id)
    }

    fn map_in_container(&self, container: &str) -> Option<MapId> {
        self.state.lock().containers.get(container).copied()
    }

    fn remove_map(&self, map: MapId) -> Result<(), MapError> {
        let mut state = self.state.lock();
        let instance = state.maps.remove(&map).ok_or(MapError::UnknownMap(map))?;
        state.containers.remove(&instance.container);

        debug!("Removed map {} from '{}'", map, instance.container);
        Ok(())
    }

    fn add_marker(&self, map: MapId, marker: MarkerSpec) -> Result<MarkerId, MapError> {
        let mut state = self.state.lock();
        let id = state.allocate_id();
        state.instance(map)?.markers.insert(id, marker);
        Ok(id)
    }

    fn remove_marker(&self, map: MapId, marker: MarkerId) -> Result<(), MapError> {
        let mut state = self.state.lock();
        state.instance(map)?.markers.remove(&marker);
        Ok(())
    }

    fn set_view(&self, map: MapId, center: SelectedLocation, zoom: u8) -> Result<(), MapError> {
        let mut state = self.state.lock();
        let instance = state.instance(map)?;
        instance.center = center;
        instance.zoom = zoom;
        Ok(())
    }

    fn zoom(&self, map: MapId) -> Result<u8, MapError> {
        let mut state = self.state.lock();
        Ok(state.instance(map)?.zoom)
    }

    fn fit_bounds(&self, map: MapId, bounds: LatLngBounds) -> Result<(), MapError> {
        let mut state = self.state.lock();
        let instance = state.instance(map)?;
        instance.center = bounds.center();
        instance.zoom = zoom_for_bounds(&bounds);
        instance.fitted_bounds = Some(bounds);
        Ok(())
    }
}

/// Rough zoom level at which `bounds` fills a single world-sized tile span
fn zoom_for_bounds(bounds: &LatLngBounds) -> u8 {
    let lat_span = bounds.north_east.lat - bounds.south_west.lat;
    let lon_span = bounds.north_east.lon - bounds.south_west.lon;
    let span = lat_span.max(lon_span);
    if span <= f64::EPSILON {
        return 16;
    }
    (360.0 / span).log2().floor().clamp(1.0, 18.0) as u8
}
