pub mod commands;
pub mod ui;
pub mod util;

pub use ui::Output;
pub use util::{ProviderOverrides, load_config, read_text, resolve_language};
