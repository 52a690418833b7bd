pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod jobs;
pub mod models;
pub mod operations;
pub mod response;
pub mod routes;
pub mod rules;
pub mod services;
pub mod state;
pub mod store;
