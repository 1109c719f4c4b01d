pub mod alert;
pub mod follow;
pub mod logging;
pub mod meter;
pub mod parse;
pub mod pipeline;
pub mod rate;
pub mod render;
pub mod stats;
