pub mod handlers;
pub mod middleware;
