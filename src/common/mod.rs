pub mod config;
pub mod config_commands;
pub mod progress;

pub use config::AppConfig;
pub use progress::{progress_channel, ProgressReceiver, ProgressSender, ProgressTracker};
