pub mod commands;
pub mod output;

pub use commands::GlobalOptions;
pub use output::OutputMode;
