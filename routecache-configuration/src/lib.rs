//! # routecache-configuration
//!
//! Declarative cache setup from a YAML document: pools, routes and
//! per-route directives.
//!
//! ```yaml
//! enabled: true
//! control_header: N-CACHE
//! value_format: Json
//! backends:
//!   - type: Moka
//!     max_capacity: 10000
//!   - type: Redis
//!     connection_string: redis://127.0.0.1/
//! routes:
//!   - name: task_show
//!     path: /tasks/{id}
//!     methods: [GET]
//!     handler: TaskController::show
//!     cache:
//!       strategy: GET
//!       expires: 60s
//!       attributes: [id]
//! ```
//!
//! Pools are compiled in through the `moka` (default), `redis`, `sql` and
//! `fs` features; naming a pool whose feature is off is a configuration
//! error. An unknown strategy name or an expiry past
//! [`routecache::MAX_EXPIRY`] is rejected when the routes are built.

pub mod backend;
mod error;
mod settings;

pub use backend::Backend;
pub use error::ConfigError;
pub use settings::{Built, CacheSettings, DirectiveSettings, RouteSettings};
