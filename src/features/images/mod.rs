pub mod dtos;
pub mod function;
pub mod handlers;
pub mod models;
pub mod multipart;
pub mod routes;
pub mod services;
pub mod validation;

pub use function::{FunctionEvent, FunctionHandler};
pub use routes::routes;
pub use services::ImageService;
