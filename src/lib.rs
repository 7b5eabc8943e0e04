pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod models;
pub mod router;
pub mod service;
pub mod store;

pub use context::{DataProvider, PortfolioData};
pub use error::FolioError;
pub use gateway::Gateway;
