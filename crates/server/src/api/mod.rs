pub mod aggregates;
pub mod apps;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod rankings;
pub mod routes;
pub mod scrape;

pub use handlers::ErrorResponse;
pub use routes::create_router;
