//! Route file persistence.
//!
//! Routes live as one JSON document per slot in a directory, written by the
//! route recorder and read back into the polyline store at startup.

pub mod recorder;
pub mod route_files;

pub use recorder::RouteRecorder;
pub use route_files::{route_file_name, write_route_file, JsonRouteDirectory, RouteFile, RouteFileError};
