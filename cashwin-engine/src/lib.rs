pub mod backtest;
pub mod error;
pub mod history;
pub mod predict;
pub mod rotation;
pub mod selector;
pub mod stats;
pub mod strategies;
pub mod weights;
