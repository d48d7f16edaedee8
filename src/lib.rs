pub mod config;
pub mod constants;
pub mod engine;
pub mod high_score;
pub mod maze;
pub mod types;
