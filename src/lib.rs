pub mod app;
pub mod config;
pub mod oauth;
pub mod security;
pub mod web;
