//! Engine-wide constants and the defaults of every map-view property.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Lowest zoom level the engine supports.
pub const MIN_ZOOM: f64 = 0.0;

/// Highest zoom level the engine supports.
pub const MAX_ZOOM: f64 = 21.0;

/// Default upper zoom bound of a map view.
pub const DEFAULT_MAX_ZOOM: f64 = 20.0;

/// Maximum camera tilt in degrees.
pub const MAX_TILT: f64 = 60.0;

/// Square tile size in points. At zoom `z` the world is `TILE_SIZE * 2^z` points wide.
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection.
pub const MAX_LATITUDE: f64 = 85.051_128_779_8;

/// Equatorial radius used by Web Mercator (EPSG:3857).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Ratio between the camera focal length and the view height.
pub const FOCAL_LENGTH_RATIO: f64 = 1.5;

/// Default camera animation duration in seconds.
pub const DEFAULT_ANIMATION_DURATION: f64 = 0.2;

/// Default rendering rate.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 60.0;

/// Default scroll gesture friction.
pub const DEFAULT_SCROLL_FRICTION: f64 = 0.088;

/// Default zoom gesture friction.
pub const DEFAULT_ZOOM_FRICTION: f64 = 0.123_75;

/// Default rotate gesture friction.
pub const DEFAULT_ROTATE_FRICTION: f64 = 0.193_33;

/// Default pick tolerance for taps, in points.
pub const DEFAULT_PICK_TOLERANCE: u32 = 2;

/// Tilt change per point of vertical two-finger drag.
pub const TILT_DEGREES_PER_POINT: f64 = 0.2;

/// Marker icon default size (regular PNG).
pub const MARKER_ICON_SIZE: (f64, f64) = (25.0, 41.0);

/// Global z-index defaults, by overlay family.
pub const MARKER_GLOBAL_Z_INDEX: i32 = 200_000;
pub const SYMBOL_GLOBAL_Z_INDEX: i32 = 0;
pub const SHAPE_GLOBAL_Z_INDEX: i32 = -200_000;
pub const LOCATION_OVERLAY_GLOBAL_Z_INDEX: i32 = 300_000;

/// Reserved id of the map's location overlay.
pub const LOCATION_OVERLAY_ID: &str = "location-overlay";

/// Location overlay icon size and accuracy circle radius, in points.
pub const LOCATION_ICON_SIZE: (f64, f64) = (22.0, 22.0);
pub const LOCATION_CIRCLE_RADIUS: f64 = 18.0;

/// Default indoor focus radius, in points.
pub const DEFAULT_INDOOR_FOCUS_RADIUS: f64 = 20.0;

/// Initial camera target (Seoul City Hall) and zoom.
pub const DEFAULT_CAMERA_LAT: f64 = 37.566_610_2;
pub const DEFAULT_CAMERA_LNG: f64 = 126.978_388_1;
pub const DEFAULT_CAMERA_ZOOM: f64 = 14.0;

/// Upper bound on the number of tiles one covering query may return.
pub const MAX_COVERING_TILES: usize = 4096;

/// Capacity of the covering-tiles memo.
pub const COVERAGE_CACHE_SIZE: usize = 32;
