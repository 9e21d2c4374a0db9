//! The stock Modepress collections
//!
//! Reference layout:
//!
//! | collection | item | target | dependency |
//! |---|---|---|---|
//! | posts | author | users | optional |
//! | posts | featuredImage | files | optional |
//! | comments | post | posts | required |
//! | comments | user | users | optional |
//! | comments | parent | comments | optional |
//! | comments | children | comments | optional |
//! | categories | parent | categories | optional |
//! | categories | children | categories | optional |
//! | volumes | user | users | required |
//! | files | volume | volumes | required |
//! | files | user | users | required |
//! | files | parentFile | files | optional |

pub mod categories;
pub mod comments;
pub mod files;
pub mod posts;
pub mod users;
pub mod volumes;

use crate::error::Result;
use crate::models::ModelRegistry;
use std::sync::Arc;

/// Register every stock collection on `registry`
pub fn register_all(registry: &Arc<ModelRegistry>) -> Result<()> {
    registry.register(users::model()?)?;
    registry.register(categories::model()?)?;
    registry.register(posts::model()?)?;
    registry.register(comments::model()?)?;
    registry.register(volumes::model()?)?;
    registry.register(files::model()?)?;
    Ok(())
}
