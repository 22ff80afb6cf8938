pub mod email;
pub mod handlers;
pub mod middleware;
pub mod notifications;
pub mod routes;

pub use routes::create_router;
