mod db;
pub mod models;
pub mod tables;

pub use db::{
    ConsumeOutcome, DeleteOutcome, PurgeStats, RoleChangeOutcome, Store, StoreError,
};
