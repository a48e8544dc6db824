pub mod config;

// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{
    config_path, init_logging, load_config, load_graph_from_file, render_layout, status_summary,
    unseen_activity, write_default_config,
};

pub use config::{Config, RetrySettings, expand_path};
