pub mod auth_token;
pub mod offer;
pub mod offer_detail;
pub mod orders;
pub mod review;
pub mod user;
pub mod user_profile;
