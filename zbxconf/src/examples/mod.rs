//! Ready-made configurations, used by the CLI `render` command and as
//! end-to-end fixtures.

pub mod circus;
pub mod cluster;

use crate::errors::ConfigResult;
use crate::model::Entity;

/// Names accepted by [`generate`].
pub const NAMES: [&str; 2] = ["circus", "cluster"];

/// Build the document for the named example.
pub fn generate(name: &str) -> Option<ConfigResult<Entity>> {
    match name {
        "circus" => Some(circus::generate()),
        "cluster" => Some(cluster::generate()),
        _ => None,
    }
}
