pub mod clients;
pub mod identity;
pub mod oauth;
