use crate::{
    camera::{
        controller::{CameraController, CompletionCallback},
        position::CameraPosition,
        update::{CameraAnimation, CameraChangeReason, CameraUpdate, CameraUpdateParams},
    },
    core::{
        config::{GestureOptions, MapType, MapViewOptions, MapViewProfile},
        geo::{LatLng, LatLngBounds, Point},
        projection::Projection,
    },
    input::{
        events::{EventManager, InputEvent, MapEvent},
        handler::{GestureAction, GestureHandler},
    },
    layers::{
        base::{Pickable, PickableKind},
        groups::LayerGroups,
        location::LocationOverlay,
        symbol::Symbol,
    },
    pick::{PickEngine, PickFilter, PickHit},
    tiles::{coverage::TileCoverage, id::TileId},
    MapError, Result,
};
use crossbeam_channel::Receiver;
use futures::{channel::oneshot, Future, FutureExt};
use geo_types::Polygon;
use instant::Instant;
use std::{sync::Arc, time::Duration};

/// Styling values as they take effect. Lite mode replaces the configured
/// values with the plain defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub map_type: MapType,
    pub night_mode: bool,
    pub lightness: f64,
    pub building_height: f64,
    pub symbol_scale: f64,
    pub symbol_perspective_ratio: f64,
    pub locale: Option<String>,
    pub indoor_map_enabled: bool,
    pub indoor_focus_radius: f64,
    /// Names of the layer groups to draw, sorted
    pub layer_groups: Vec<String>,
}

/// A headless map view: camera, projection, covering tiles, picking, layer
/// groups and gestures behind one façade. Drive it with [`MapView::tick`]
/// once per frame and feed it touches through [`MapView::handle_input`].
pub struct MapView {
    options: MapViewOptions,
    camera: CameraController,
    gestures: GestureHandler,
    pickables: PickEngine,
    layer_groups: LayerGroups,
    coverage: TileCoverage,
    events: EventManager,
}

impl MapView {
    pub fn new(options: MapViewOptions, size: Point) -> Result<Self> {
        options.validate()?;
        let options = options.sanitized();

        let mut camera = CameraController::new(options.camera, size);
        camera.set_zoom_bounds(options.min_zoom, options.max_zoom)?;
        camera.set_extent(options.extent)?;
        camera.set_default_duration(Duration::from_secs_f64(options.animation_duration));
        // the initial placement is not a camera change
        camera.take_events();

        let mut layer_groups = LayerGroups::new();
        layer_groups.apply(&options.layer_groups);

        log::debug!(
            "map view {}x{} created at {:?}",
            size.x,
            size.y,
            camera.position()
        );

        Ok(Self {
            gestures: GestureHandler::new(options.gestures),
            camera,
            pickables: PickEngine::new(),
            layer_groups,
            coverage: TileCoverage::new(),
            events: EventManager::new(),
            options,
        })
    }

    pub fn with_profile(profile: MapViewProfile, size: Point) -> Result<Self> {
        Self::new(profile.resolve(), size)
    }

    /// Current configuration, camera and layer groups included
    pub fn options(&self) -> MapViewOptions {
        MapViewOptions {
            camera: self.camera.position(),
            layer_groups: self.layer_groups.snapshot(),
            ..self.options.clone()
        }
    }

    // Camera

    pub fn camera_position(&self) -> CameraPosition {
        self.camera.position()
    }

    pub fn is_animating(&self) -> bool {
        self.camera.is_animating()
    }

    /// Whether the camera moved and has not settled yet
    pub fn is_moving(&self) -> bool {
        self.camera.is_moving() || self.gestures.is_touching() || self.gestures.is_inertia_active()
    }

    pub fn move_camera(&mut self, update: CameraUpdate) -> Result<()> {
        self.move_camera_with_completion(update, None)
    }

    /// Moves the camera; `completion` receives `true` if the move is
    /// interrupted before it reaches its target
    pub fn move_camera_with_completion(
        &mut self,
        update: CameraUpdate,
        completion: Option<CompletionCallback>,
    ) -> Result<()> {
        if update.reason != CameraChangeReason::Gesture {
            self.gestures.stop_inertia();
        }
        let result = self.camera.move_camera_with_completion(update, completion);
        self.settle_if_idle();
        self.flush_camera_events();
        result
    }

    /// Moves the camera and resolves to the cancellation flag once the move ends.
    /// A view dropped mid-move resolves to `true`.
    pub fn move_camera_async(&mut self, update: CameraUpdate) -> Result<impl Future<Output = bool>> {
        let (sender, receiver) = oneshot::channel();
        let completion: CompletionCallback = Box::new(move |cancelled| {
            let _ = sender.send(cancelled);
        });
        self.move_camera_with_completion(update, Some(completion))?;
        Ok(receiver.map(|result| result.unwrap_or(true)))
    }

    /// Stops the running transition and any gesture inertia
    pub fn cancel_transitions(&mut self) -> bool {
        let cancelled = self.camera.cancel_transitions();
        let stopped = self.gestures.stop_inertia();
        self.settle_if_idle();
        self.flush_camera_events();
        cancelled || stopped
    }

    pub fn min_zoom(&self) -> f64 {
        self.camera.min_zoom()
    }

    pub fn max_zoom(&self) -> f64 {
        self.camera.max_zoom()
    }

    pub fn set_min_zoom(&mut self, min_zoom: f64) -> Result<()> {
        self.set_zoom_bounds(min_zoom, self.camera.max_zoom())
    }

    pub fn set_max_zoom(&mut self, max_zoom: f64) -> Result<()> {
        self.set_zoom_bounds(self.camera.min_zoom(), max_zoom)
    }

    pub fn set_zoom_bounds(&mut self, min_zoom: f64, max_zoom: f64) -> Result<()> {
        self.camera.set_zoom_bounds(min_zoom, max_zoom)?;
        self.options.min_zoom = self.camera.min_zoom();
        self.options.max_zoom = self.camera.max_zoom();
        self.settle_if_idle();
        self.flush_camera_events();
        Ok(())
    }

    pub fn extent(&self) -> Option<LatLngBounds> {
        self.camera.extent()
    }

    pub fn set_extent(&mut self, extent: Option<LatLngBounds>) -> Result<()> {
        self.camera.set_extent(extent)?;
        self.options.extent = extent;
        self.settle_if_idle();
        self.flush_camera_events();
        Ok(())
    }

    /// Default camera animation duration in seconds
    pub fn animation_duration(&self) -> f64 {
        self.options.animation_duration
    }

    pub fn set_animation_duration(&mut self, seconds: f64) -> Result<()> {
        if !(seconds.is_finite() && seconds >= 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "animation duration must be non-negative, got {}",
                seconds
            )));
        }
        self.options.animation_duration = seconds;
        self.camera.set_default_duration(Duration::from_secs_f64(seconds));
        Ok(())
    }

    pub fn preferred_frames_per_second(&self) -> f64 {
        self.options.preferred_frames_per_second
    }

    pub fn set_preferred_frames_per_second(&mut self, fps: f64) -> Result<()> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(MapError::InvalidConfig(format!(
                "preferred frames per second must be positive, got {}",
                fps
            )));
        }
        self.options.preferred_frames_per_second = fps;
        Ok(())
    }

    /// Frame interval matching the preferred frame rate
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.options.preferred_frames_per_second)
    }

    // View

    pub fn size(&self) -> Point {
        self.camera.size()
    }

    pub fn resize(&mut self, size: Point) {
        let previous = self.camera.size();
        self.camera.set_size(size);
        let size = self.camera.size();
        if size != previous {
            log::debug!("map view resized to {}x{}", size.x, size.y);
            self.events.emit(MapEvent::Resized { size });
        }
    }

    pub fn projection(&self) -> Projection {
        self.camera.projection()
    }

    /// Visible ground polygon in (lng, lat) order
    pub fn content_region(&self) -> Polygon<f64> {
        self.projection().content_region()
    }

    pub fn content_bounds(&self) -> LatLngBounds {
        self.projection().content_bounds()
    }

    pub fn from_screen_location(&self, point: &Point) -> Option<LatLng> {
        self.projection().from_screen_location(point)
    }

    pub fn to_screen_location(&self, lat_lng: &LatLng) -> Option<Point> {
        self.projection().to_screen_location(lat_lng)
    }

    pub fn meters_per_pixel(&self) -> f64 {
        self.projection().meters_per_pixel()
    }

    // Tiles

    /// Tiles covering the visible ground at the current tile zoom, nearest first
    pub fn covering_tile_ids(&self) -> Arc<Vec<TileId>> {
        self.coverage.covering_tile_ids(&self.projection())
    }

    pub fn covering_tile_ids_at_zoom(&self, zoom: i32) -> Result<Arc<Vec<TileId>>> {
        self.coverage
            .covering_tile_ids_at_zoom(&self.projection(), zoom)
    }

    // Styling

    pub fn map_type(&self) -> MapType {
        self.options.map_type
    }

    pub fn set_map_type(&mut self, map_type: MapType) {
        self.options.map_type = map_type;
    }

    pub fn is_lite_mode_enabled(&self) -> bool {
        self.options.lite_mode_enabled
    }

    pub fn set_lite_mode_enabled(&mut self, enabled: bool) {
        self.options.lite_mode_enabled = enabled;
    }

    pub fn is_night_mode_enabled(&self) -> bool {
        self.options.night_mode_enabled
    }

    /// Has no visible effect unless the map type has a night style
    pub fn set_night_mode_enabled(&mut self, enabled: bool) {
        self.options.night_mode_enabled = enabled;
    }

    pub fn lightness(&self) -> f64 {
        self.options.lightness
    }

    pub fn set_lightness(&mut self, lightness: f64) {
        self.options.lightness = lightness;
        self.options = self.options.sanitized();
    }

    pub fn building_height(&self) -> f64 {
        self.options.building_height
    }

    pub fn set_building_height(&mut self, height: f64) {
        self.options.building_height = height;
        self.options = self.options.sanitized();
    }

    pub fn symbol_scale(&self) -> f64 {
        self.options.symbol_scale
    }

    pub fn set_symbol_scale(&mut self, scale: f64) {
        self.options.symbol_scale = scale;
        self.options = self.options.sanitized();
    }

    pub fn symbol_perspective_ratio(&self) -> f64 {
        self.options.symbol_perspective_ratio
    }

    pub fn set_symbol_perspective_ratio(&mut self, ratio: f64) {
        self.options.symbol_perspective_ratio = ratio;
        self.options = self.options.sanitized();
    }

    pub fn locale(&self) -> Option<&str> {
        self.options.locale.as_deref()
    }

    /// `None` follows the system locale
    pub fn set_locale(&mut self, locale: Option<String>) {
        self.options.locale = locale;
    }

    pub fn is_indoor_map_enabled(&self) -> bool {
        self.options.indoor_map_enabled
    }

    /// Has no effect in lite mode
    pub fn set_indoor_map_enabled(&mut self, enabled: bool) {
        self.options.indoor_map_enabled = enabled;
    }

    /// Indoor focus radius in points
    pub fn indoor_focus_radius(&self) -> f64 {
        self.options.indoor_focus_radius
    }

    pub fn set_indoor_focus_radius(&mut self, radius: f64) {
        self.options.indoor_focus_radius = radius;
        self.options = self.options.sanitized();
    }

    /// The styling a renderer should apply right now
    pub fn render_style(&self) -> RenderStyle {
        let options = &self.options;
        if options.lite_mode_enabled {
            let defaults = MapViewOptions::default();
            return RenderStyle {
                map_type: MapType::Basic,
                night_mode: false,
                lightness: defaults.lightness,
                building_height: defaults.building_height,
                symbol_scale: defaults.symbol_scale,
                symbol_perspective_ratio: defaults.symbol_perspective_ratio,
                locale: options.locale.clone(),
                indoor_map_enabled: false,
                indoor_focus_radius: defaults.indoor_focus_radius,
                layer_groups: LayerGroups::new().enabled(),
            };
        }
        RenderStyle {
            map_type: options.map_type,
            night_mode: options.night_mode_enabled && options.map_type.supports_night_mode(),
            lightness: options.lightness,
            building_height: options.building_height,
            symbol_scale: options.symbol_scale,
            symbol_perspective_ratio: options.symbol_perspective_ratio,
            locale: options.locale.clone(),
            indoor_map_enabled: options.indoor_map_enabled,
            indoor_focus_radius: options.indoor_focus_radius,
            layer_groups: self.layer_groups.enabled(),
        }
    }

    // Layer groups

    pub fn set_layer_group(&mut self, name: &str, enabled: bool) {
        if self.layer_groups.set(name, enabled) {
            log::debug!("layer group {} {}", name, if enabled { "on" } else { "off" });
            self.events.emit(MapEvent::LayerGroupChanged {
                group: name.to_string(),
                enabled,
            });
        }
    }

    pub fn layer_group_enabled(&self, name: &str) -> bool {
        self.layer_groups.is_enabled(name)
    }

    pub fn layer_groups(&self) -> &LayerGroups {
        &self.layer_groups
    }

    // Gestures

    pub fn gesture_options(&self) -> &GestureOptions {
        self.gestures.options()
    }

    pub fn set_gesture_options(&mut self, options: GestureOptions) {
        self.gestures.set_options(options);
        self.options.gestures = *self.gestures.options();
    }

    pub fn set_scroll_gestures_enabled(&mut self, enabled: bool) {
        self.set_gesture_options(GestureOptions {
            scroll_enabled: enabled,
            ..*self.gestures.options()
        });
    }

    pub fn set_zoom_gestures_enabled(&mut self, enabled: bool) {
        self.set_gesture_options(GestureOptions {
            zoom_enabled: enabled,
            ..*self.gestures.options()
        });
    }

    pub fn set_tilt_gestures_enabled(&mut self, enabled: bool) {
        self.set_gesture_options(GestureOptions {
            tilt_enabled: enabled,
            ..*self.gestures.options()
        });
    }

    pub fn set_rotate_gestures_enabled(&mut self, enabled: bool) {
        self.set_gesture_options(GestureOptions {
            rotate_enabled: enabled,
            ..*self.gestures.options()
        });
    }

    pub fn set_stop_gesture_enabled(&mut self, enabled: bool) {
        self.set_gesture_options(GestureOptions {
            stop_enabled: enabled,
            ..*self.gestures.options()
        });
    }

    /// Frictions are clamped into [0, 1]
    pub fn set_frictions(&mut self, scroll: f64, zoom: f64, rotate: f64) {
        self.set_gesture_options(GestureOptions {
            scroll_friction: scroll,
            zoom_friction: zoom,
            rotate_friction: rotate,
            ..*self.gestures.options()
        });
    }

    // Picking

    pub fn pick_tolerance(&self) -> u32 {
        self.options.pick_tolerance
    }

    pub fn set_pick_tolerance(&mut self, tolerance: u32) {
        self.options.pick_tolerance = tolerance;
    }

    pub fn add_pickable<P: Pickable + 'static>(&mut self, pickable: P) -> Result<()> {
        self.pickables.add(pickable)
    }

    pub fn update_pickable<P: Pickable + 'static>(&mut self, pickable: P) -> Result<()> {
        self.pickables.update(pickable)
    }

    pub fn remove_pickable(&mut self, id: &str) -> Option<Box<dyn Pickable>> {
        self.pickables.remove(id)
    }

    pub fn pickable<T: 'static>(&self, id: &str) -> Option<&T> {
        self.pickables.get_as::<T>(id)
    }

    pub fn pickables(&self) -> &PickEngine {
        &self.pickables
    }

    pub fn pickables_mut(&mut self) -> &mut PickEngine {
        &mut self.pickables
    }

    /// Everything within `tolerance` points of `point`, topmost first
    pub fn pick_all(&self, point: &Point, tolerance: u32) -> Vec<PickHit> {
        self.pickables
            .pick_all(&self.projection(), point, tolerance, &self.pick_filter())
    }

    /// The topmost pickable exactly under `point`
    pub fn pick(&self, point: &Point) -> Option<PickHit> {
        self.pickables
            .pick(&self.projection(), point, &self.pick_filter())
    }

    // Location

    /// The map's location overlay; always the same object
    pub fn location_overlay(&self) -> &LocationOverlay {
        self.pickables.location_overlay()
    }

    /// Edits the location overlay in place
    pub fn update_location_overlay<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut LocationOverlay),
    {
        self.pickables.update_location_overlay(edit);
    }

    /// Shows the location overlay at `position`, turned to `bearing` when
    /// given. With `follow` the camera glides there too, reporting
    /// [`CameraChangeReason::Location`].
    pub fn update_location(&mut self, position: LatLng, bearing: Option<f64>, follow: bool) -> Result<()> {
        if !position.is_valid() {
            return Err(MapError::InvalidCoordinates(format!(
                "location {:?} is not a valid coordinate",
                position
            )));
        }
        self.pickables.update_location_overlay(|overlay| {
            overlay.set_position(position);
            if let Some(bearing) = bearing {
                overlay.set_bearing(bearing);
            }
            overlay.set_visible(true);
        });
        if follow {
            self.move_camera(
                CameraUpdate::scroll_to(position)
                    .animate(CameraAnimation::EaseIn)
                    .reason(CameraChangeReason::Location),
            )?;
        }
        Ok(())
    }

    fn pick_filter(&self) -> PickFilter<'_> {
        let lite = self.options.lite_mode_enabled;
        PickFilter {
            layer_groups: &self.layer_groups,
            symbol_scale: if lite { 1.0 } else { self.options.symbol_scale },
            symbols_enabled: !lite,
        }
    }

    // Events

    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(event_type, callback);
    }

    pub fn off(&mut self, event_type: &str) {
        self.events.off(event_type);
    }

    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        self.events.subscribe()
    }

    /// Dispatches queued events and returns them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process_events()
    }

    // Frame loop and input

    /// Advances camera transitions and gesture inertia by `delta_time` seconds
    pub fn tick(&mut self, delta_time: f64) {
        let delta_time = if delta_time.is_finite() {
            delta_time.max(0.0)
        } else {
            0.0
        };

        self.camera.tick(delta_time);
        for action in self.gestures.tick(delta_time) {
            if let Err(err) = self.apply_action(action) {
                log::warn!("dropping inertial camera step: {}", err);
                self.gestures.stop_inertia();
            }
        }

        self.settle_if_idle();
        self.flush_camera_events();
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Result<()> {
        self.handle_input_at(event, Instant::now())
    }

    /// Handles an input event that happened at `now`
    pub fn handle_input_at(&mut self, event: InputEvent, now: Instant) -> Result<()> {
        let result = match event {
            InputEvent::Resize { size } => {
                self.resize(size);
                Ok(())
            }
            InputEvent::Touch { event_type, touches } => {
                let animating = self.camera.is_animating();
                let actions = self.gestures.handle(event_type, &touches, now, animating);
                self.apply_actions(actions)
            }
        };

        self.settle_if_idle();
        self.flush_camera_events();
        result
    }

    /// Applies every action even when one fails; returns the first failure
    fn apply_actions(&mut self, actions: Vec<GestureAction>) -> Result<()> {
        let mut first_error = None;
        for action in actions {
            if let Err(err) = self.apply_action(action) {
                log::warn!("gesture step failed: {}", err);
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn apply_action(&mut self, action: GestureAction) -> Result<()> {
        match action {
            GestureAction::CancelTransitions => {
                self.camera.cancel_transitions();
                Ok(())
            }
            GestureAction::ScrollBy(delta) => self.camera.apply_gesture(CameraUpdate::scroll_by(delta)),
            GestureAction::ZoomBy { delta, pivot } => {
                let pivot = self.normalized_pivot(&pivot);
                self.camera
                    .apply_gesture(CameraUpdate::zoom_by(delta).pivot(pivot))
            }
            GestureAction::RotateBy { degrees, pivot } => {
                let pivot = self.normalized_pivot(&pivot);
                let params = CameraUpdateParams::new().rotate_by(degrees);
                self.camera
                    .apply_gesture(CameraUpdate::with_params(params).pivot(pivot))
            }
            GestureAction::TiltBy(degrees) => {
                let params = CameraUpdateParams::new().tilt_by(degrees);
                self.camera.apply_gesture(CameraUpdate::with_params(params))
            }
            GestureAction::AnimatedZoom { delta, pivot } => {
                let pivot = self.normalized_pivot(&pivot);
                self.camera.move_camera(
                    CameraUpdate::zoom_by(delta)
                        .pivot(pivot)
                        .animate(CameraAnimation::EaseIn)
                        .reason(CameraChangeReason::Gesture),
                )
            }
            GestureAction::Tap(point) => {
                self.tap(point);
                Ok(())
            }
        }
    }

    /// Picks under a tap and emits the matching tap event
    fn tap(&mut self, point: Point) {
        let projection = self.projection();
        let hit = self
            .pickables
            .pick_all(&projection, &point, self.options.pick_tolerance, &self.pick_filter())
            .into_iter()
            .next();

        let event = match hit {
            Some(hit) if hit.kind == PickableKind::Symbol => {
                let caption = self
                    .pickables
                    .get_as::<Symbol>(&hit.id)
                    .map(|symbol| symbol.caption().to_string())
                    .unwrap_or_default();
                MapEvent::SymbolTapped {
                    symbol_id: hit.id,
                    caption,
                    point,
                }
            }
            Some(hit) => MapEvent::OverlayTapped {
                overlay_id: hit.id,
                point,
            },
            None => match projection.from_screen_location(&point) {
                Some(lat_lng) => MapEvent::MapTapped { point, lat_lng },
                None => return,
            },
        };
        log::debug!("tap at ({:.1}, {:.1}): {}", point.x, point.y, event.event_type());
        self.events.emit(event);
    }

    fn normalized_pivot(&self, point: &Point) -> Point {
        let size = self.camera.size();
        if size.x <= 0.0 || size.y <= 0.0 {
            return Point::new(0.5, 0.5);
        }
        Point::new(point.x / size.x, point.y / size.y)
    }

    fn settle_if_idle(&mut self) {
        if !self.camera.is_animating()
            && !self.gestures.is_touching()
            && !self.gestures.is_inertia_active()
        {
            self.camera.settle();
        }
    }

    fn flush_camera_events(&mut self) {
        for event in self.camera.take_events() {
            self.events.emit(event);
        }
    }
}
