// src/lib.rs
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod links;
pub mod model;
pub mod report;
pub mod selectors;
pub mod sink;
pub mod spider;
pub mod surface;
pub mod wait;
pub mod window;
