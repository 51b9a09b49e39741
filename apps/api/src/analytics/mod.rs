// Analytics: anonymous usage events and the admin reporting surface.
// Requires DATABASE_URL; the guide, scorecard and improve routes never touch it.

pub mod auth;
pub mod events;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod query;
pub mod schema;
pub mod stats;
