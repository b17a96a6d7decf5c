//! Records exchanged with the remote booking API.
//! Individual models live in separate files and are re-exported here so
//! callers can `use crate::models::*;`.

pub mod availability;
pub mod booking;
pub mod resource;

pub use self::availability::*;
pub use self::booking::*;
pub use self::resource::*;
