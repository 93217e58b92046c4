pub mod analytics;
pub mod holding;
pub mod performance;
pub mod portfolio;
pub mod price;
pub mod settings;
pub mod transaction;
