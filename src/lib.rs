pub mod artifact;
pub mod collect;
pub mod config;
pub mod consensus;
pub mod error;
pub mod fetch;
pub mod output;
pub mod providers;
pub mod record;
pub mod time;
