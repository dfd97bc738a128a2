pub mod browser;
pub mod cli;
pub mod config;
pub mod extract;
pub mod guard;
pub mod normalize;
pub mod policy;
pub mod report;
pub mod store;
pub mod util;
pub mod wait;
pub mod walker;
