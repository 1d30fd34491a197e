pub mod mysql_data;
pub mod nginx_data;
pub mod process_data;
pub mod system_data;

// Re-export the main types for easy access
pub use mysql_data::*;
pub use nginx_data::*;
pub use process_data::*;
pub use system_data::*;
