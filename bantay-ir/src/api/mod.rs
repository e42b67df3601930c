//! HTTP API handlers for bantay-ir
//!
//! Everything under `/api` passes the request-signing middleware and names
//! its caller in the `X-Actor-Id` header. `/track`, `/health` and `/events`
//! are public; `/events` carries only the public event projection.

pub mod accidents;
pub mod auth;
pub mod concerns;
pub mod detections;
pub mod devices;
pub mod distributions;
pub mod events;
pub mod extract;
pub mod health;
pub mod media;
pub mod timeout;
pub mod track;
pub mod uploads;
pub mod users;

pub use accidents::accident_routes;
pub use auth::auth_middleware;
pub use concerns::concern_routes;
pub use detections::detection_routes;
pub use devices::device_routes;
pub use distributions::distribution_routes;
pub use events::event_routes;
pub use health::health_routes;
pub use media::media_routes;
pub use timeout::timeout_middleware;
pub use track::track_routes;
pub use users::user_routes;
