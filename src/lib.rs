pub mod align;
pub mod chart;
pub mod cli;
pub mod client;
pub mod constants;
pub mod correlation;
pub mod heatmap;
pub mod logging;
pub mod model;
pub mod simulator;
pub mod source;
pub mod stats;
