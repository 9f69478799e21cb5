pub mod json_file;
pub mod logging;
pub mod time;
