// Utilities shared by the binary and the services
pub mod logger; // env_logger setup
pub mod tools;  // External tool discovery (ffmpeg, svc)
