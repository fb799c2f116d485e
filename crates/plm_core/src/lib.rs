pub mod collate;
pub mod config;
pub mod datetime;
pub mod error;
pub mod export;
pub mod field_info_api;
pub mod filter;
pub mod format;
pub mod model;
pub mod normalize;
pub mod service;
pub mod sort;
pub mod summary;
pub mod task_api;
pub mod view;
