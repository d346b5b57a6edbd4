//! SQLite store for the storm damage workspace.
//!
//! Holds the static spatial grid the damage models score, the fire-station
//! overlay data, and the persistent cache of raw weather API responses.
//!
//! # Usage
//!
//! ```rust
//! use sdd_db::Database;
//!
//! let db = Database::new().unwrap();
//! db.load_grid_cells(
//!     "cell_id,service_area,geometry,average_building_age,building_area,trees\n\
//!      A1,Centrum,\"POLYGON((0 0,100 0,100 100,0 100,0 0))\",54.5,1200.0,14\n",
//! )
//! .unwrap();
//! let grid = db.query_grid_cells().unwrap();
//! assert_eq!(grid.len(), 1);
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.
//!
//! - `grid_cells` - Grid geometry (WKT) and static covariates
//! - `fire_stations` - Station location, service-area polygon, vehicle count
//! - `http_cache` - Weather API response bodies keyed by request

mod cache;
mod loader;
pub mod models;
mod queries;
pub mod schema;

use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// SQLite connection shared by the grid queries and the response cache.
///
/// Cloning is cheap and every clone sees the same connection, so one handle
/// can be boxed into the weather client as its cache while another serves
/// grid queries.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create an empty in-memory database with the full schema applied.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open (or create) the database file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        log::info!("Opened database at {}", path.as_ref().display());
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}
