use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::backend::{MapBackend, MapId, MarkerId, MarkerSpec, TileLayer};
use super::geolocation::{GeolocationProvider, PositionOptions};
use crate::config::{GeolocationConfig, MapConfig};
use crate::error::{GeolocationError, MapError};
use crate::geo::{LatLngBounds, SelectedLocation};

/// Invoked with every location the user selects
pub type LocationCallback = Arc<dyn Fn(SelectedLocation) + Send + Sync>;

/// Whether clicks select a location or the map only displays stories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    Select,
    Display,
}

/// A story pin with its popup
#[derive(Debug, Clone, PartialEq)]
pub struct StoryMarker {
    pub position: SelectedLocation,
    pub title: String,
    pub popup_content: String,
}

#[derive(Debug, Clone)]
pub struct PickerOptions {
    pub zoom: u8,
    pub tiles: TileLayer,
    pub position: PositionOptions,
}

impl Default for PickerOptions {
    fn default() -> Self {
        Self {
            zoom: 13,
            tiles: TileLayer::default(),
            position: PositionOptions::default(),
        }
    }
}

impl PickerOptions {
    pub fn from_config(map: &MapConfig, geolocation: &GeolocationConfig) -> Self {
        Self {
            zoom: map.default_zoom,
            tiles: TileLayer {
                url_template: map.tile_url.clone(),
                attribution: map.attribution.clone(),
            },
            position: PositionOptions::from(geolocation),
        }
    }
}

#[derive(Default)]
struct PickerState {
    map: Option<MapId>,
    container: Option<String>,
    selection_marker: Option<MarkerId>,
    selected: Option<SelectedLocation>,
    story_markers: Vec<(MarkerId, SelectedLocation)>,
    callback: Option<LocationCallback>,
}

struct PickerInner {
    backend: Arc<dyn MapBackend>,
    geolocation: Arc<dyn GeolocationProvider>,
    mode: MapMode,
    options: PickerOptions,
    state: Mutex<PickerState>,
    // Bumped on initialize/destroy so late geolocation answers can be dropped
    generation: AtomicU64,
}

/// Interactive map holding at most one selected-location marker.
///
/// Cloning yields another handle to the same picker.
#[derive(Clone)]
pub struct LocationPicker {
    inner: Arc<PickerInner>,
}

impl LocationPicker {
    pub fn new(
        backend: Arc<dyn MapBackend>,
        geolocation: Arc<dyn GeolocationProvider>,
        mode: MapMode,
        options: PickerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(PickerInner {
                backend,
                geolocation,
                mode,
                options,
                state: Mutex::new(PickerState::default()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn mode(&self) -> MapMode {
        self.inner.mode
    }

    pub fn map_id(&self) -> Option<MapId> {
        self.inner.state.lock().map
    }

    pub fn is_initialized(&self) -> bool {
        self.map_id().is_some()
    }

    pub fn selected(&self) -> Option<SelectedLocation> {
        self.inner.state.lock().selected
    }

    /// Mount a map in `container`, tearing down any map already living there
    pub fn initialize(
        &self,
        container: &str,
        initial_center: SelectedLocation,
    ) -> Result<MapId, MapError> {
        if !initial_center.is_valid() {
            return Err(MapError::InvalidCoordinates {
                lat: initial_center.lat,
                lon: initial_center.lon,
            });
        }

        let backend = &self.inner.backend;
        let mut state = self.inner.state.lock();

        if state.map.is_some() {
            self.teardown(&mut state);
        }

        if let Some(existing) = backend.map_in_container(container) {
            warn!(
                "Container '{}' already hosts map {}; removing it first",
                container, existing
            );
            backend.remove_map(existing)?;
        }

        let id = backend.create_map(
            container,
            initial_center,
            self.inner.options.zoom,
            &self.inner.options.tiles,
        )?;
        state.map = Some(id);
        state.container = Some(container.to_string());
        self.inner.generation.fetch_add(1, Ordering::SeqCst);

        info!(
            "Map {} initialized in '{}' ({:?} mode) at {}",
            id, container, self.inner.mode, initial_center
        );
        Ok(id)
    }

    /// Replace the selection callback
    pub fn on_location_selected<F>(&self, callback: F)
    where
        F: Fn(SelectedLocation) + Send + Sync + 'static,
    {
        self.inner.state.lock().callback = Some(Arc::new(callback));
    }

    /// Place the single selection marker and recentre, keeping the zoom
    pub fn set_marker(&self, lat: f64, lon: f64) -> Result<SelectedLocation, MapError> {
        let location = SelectedLocation::new(lat, lon)?;
        let mut state = self.inner.state.lock();
        self.place_selection(&mut state, location)?;
        Ok(location)
    }

    /// Map click forwarded from the rendering layer
    pub fn handle_click(&self, lat: f64, lon: f64) -> Result<Option<SelectedLocation>, MapError> {
        self.select(lat, lon, "click")
    }

    /// Marker drag end forwarded from the rendering layer
    pub fn handle_marker_drag(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<Option<SelectedLocation>, MapError> {
        self.select(lat, lon, "drag")
    }

    /// Ask the device where it is, then mark and centre on that spot.
    ///
    /// An answer arriving after `destroy` or a re-`initialize` is returned
    /// but leaves the map untouched.
    pub async fn resolve_current_position(&self) -> Result<SelectedLocation, GeolocationError> {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let options = &self.inner.options.position;

        let position = tokio::time::timeout(
            options.timeout,
            self.inner.geolocation.current_position(options),
        )
        .await
        .map_err(|_| GeolocationError::Timeout)??;

        let location = SelectedLocation::new(position.latitude, position.longitude)
            .map_err(|_| GeolocationError::Unavailable)?;

        let callback = {
            let mut state = self.inner.state.lock();
            if state.map.is_none() || self.inner.generation.load(Ordering::SeqCst) != generation {
                debug!("Ignoring stale geolocation result {}", location);
                return Ok(location);
            }
            if let Err(e) = self.place_selection(&mut state, location) {
                warn!("Failed to mark current position {}: {}", location, e);
                return Ok(location);
            }
            state.callback.clone()
        };

        info!("Resolved current position {}", location);
        if let Some(callback) = callback {
            callback(location);
        }
        Ok(location)
    }

    /// Replace every story marker with `markers`
    pub fn add_markers(&self, markers: &[StoryMarker]) -> Result<usize, MapError> {
        let backend = &self.inner.backend;
        let mut state = self.inner.state.lock();
        let map = state.map.ok_or(MapError::NotInitialized)?;

        for (marker, _) in state.story_markers.drain(..) {
            backend.remove_marker(map, marker)?;
        }

        for marker in markers {
            let id = backend.add_marker(
                map,
                MarkerSpec {
                    position: marker.position,
                    title: marker.title.clone(),
                    draggable: false,
                    popup: Some(marker.popup_content.clone()),
                },
            )?;
            state.story_markers.push((id, marker.position));
        }

        debug!("Placed {} story markers on map {}", markers.len(), map);
        Ok(markers.len())
    }

    /// Remove the selection marker and every story marker
    pub fn clear_markers(&self) -> Result<(), MapError> {
        let mut state = self.inner.state.lock();
        let map = state.map.ok_or(MapError::NotInitialized)?;
        self.remove_all_markers(&mut state, map)?;
        state.selected = None;
        Ok(())
    }

    pub fn set_view(&self, center: SelectedLocation, zoom: u8) -> Result<(), MapError> {
        let map = self.map_id().ok_or(MapError::NotInitialized)?;
        self.inner.backend.set_view(map, center, zoom)
    }

    pub fn fit_bounds(&self, bounds: LatLngBounds) -> Result<(), MapError> {
        let map = self.map_id().ok_or(MapError::NotInitialized)?;
        self.inner.backend.fit_bounds(map, bounds)
    }

    /// Frame every story marker; `None` when there are none
    pub fn fit_to_markers(&self) -> Result<Option<LatLngBounds>, MapError> {
        let (map, bounds) = {
            let state = self.inner.state.lock();
            let map = state.map.ok_or(MapError::NotInitialized)?;
            let bounds = LatLngBounds::enclosing(state.story_markers.iter().map(|(_, p)| *p));
            (map, bounds)
        };

        if let Some(bounds) = bounds {
            self.inner.backend.fit_bounds(map, bounds)?;
        }
        Ok(bounds)
    }

    /// Release the map and all markers. Idempotent.
    pub fn destroy(&self) {
        let mut state = self.inner.state.lock();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.teardown(&mut state);
        state.callback = None;
    }

    fn select(
        &self,
        lat: f64,
        lon: f64,
        source: &str,
    ) -> Result<Option<SelectedLocation>, MapError> {
        if self.inner.mode == MapMode::Display {
            debug!("Ignoring map {} in display mode", source);
            return Ok(None);
        }

        let location = SelectedLocation::new(lat, lon)?;
        let callback = {
            let mut state = self.inner.state.lock();
            self.place_selection(&mut state, location)?;
            state.callback.clone()
        };

        debug!("Location selected by {}: {}", source, location);
        if let Some(callback) = callback {
            callback(location);
        }
        Ok(Some(location))
    }

    fn place_selection(
        &self,
        state: &mut PickerState,
        location: SelectedLocation,
    ) -> Result<(), MapError> {
        let backend = &self.inner.backend;
        let map = state.map.ok_or(MapError::NotInitialized)?;

        if let Some(previous) = state.selection_marker.take() {
            backend.remove_marker(map, previous)?;
        }

        let marker = backend.add_marker(
            map,
            MarkerSpec {
                position: location,
                title: "Selected Location".to_string(),
                draggable: self.inner.mode == MapMode::Select,
                popup: None,
            },
        )?;
        state.selection_marker = Some(marker);
        state.selected = Some(location);

        let zoom = backend.zoom(map)?;
        backend.set_view(map, location, zoom)?;
        Ok(())
    }

    fn remove_all_markers(&self, state: &mut PickerState, map: MapId) -> Result<(), MapError> {
        let backend = &self.inner.backend;
        if let Some(marker) = state.selection_marker.take() {
            backend.remove_marker(map, marker)?;
        }
        for (marker, _) in state.story_markers.drain(..) {
            backend.remove_marker(map, marker)?;
        }
        Ok(())
    }

    fn teardown(&self, state: &mut PickerState) {
        if let Some(map) = state.map.take() {
            if let Err(e) = self.remove_all_markers(state, map) {
                warn!("Failed to clear markers of map {}: {}", map, e);
            }
            if let Err(e) = self.inner.backend.remove_map(map) {
                warn!("Failed to remove map {}: {}", map, e);
            }
            debug!(
                "Map {} torn down from '{}'",
                map,
                state.container.as_deref().unwrap_or("?")
            );
        }
        state.container = None;
        state.selection_marker = None;
        state.story_markers.clear();
        state.selected = None;
    }
}
