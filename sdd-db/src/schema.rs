//! SQL schema for the storm damage store.
//!
//! Applied as a single batch whenever a database is opened; every statement
//! is `IF NOT EXISTS`, so reopening an existing file is a no-op.

/// Returns the full SQL schema as a single batch string.
///
/// - `grid_cells` - one row per grid cell: geometry as WKT (EPSG:28992),
///   service area and the static covariates used by the damage models
/// - `fire_stations` - one row per service area: station point and coverage
///   polygon as WKT, municipality and vehicle count
/// - `http_cache` - raw weather API bodies with their storage time and
///   time-to-live (`NULL` for entries that never expire)
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS grid_cells (
        cell_id TEXT PRIMARY KEY,
        service_area TEXT NOT NULL,
        geometry TEXT NOT NULL,
        average_building_age REAL,
        building_area REAL,
        trees REAL
    );
    CREATE INDEX IF NOT EXISTS idx_grid_service_area ON grid_cells(service_area);

    CREATE TABLE IF NOT EXISTS fire_stations (
        service_area TEXT PRIMARY KEY,
        municipality TEXT NOT NULL,
        vehicle_count INTEGER NOT NULL,
        location TEXT NOT NULL,
        coverage TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS http_cache (
        cache_key TEXT PRIMARY KEY,
        body TEXT NOT NULL,
        stored_at TEXT NOT NULL,
        ttl_seconds INTEGER
    );
    "#
}
