pub mod auth;
pub mod base_info;
pub mod health;
pub mod offers;
pub mod orders;
pub mod profiles;
pub mod reviews;
