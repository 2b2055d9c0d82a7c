mod files;
mod size;
mod time;

// Export utility functions
pub use self::files::{create_dirs, destination_path, episode_file_name, sanitize_filename};
pub use self::size::format_bytes;
pub use self::time::format_duration;
