// Services module
// Contains business logic separated by domain areas

pub mod archive;    // Dataset archives
pub mod audio;      // ffmpeg/WAV helpers
pub mod catalog;    // Trained models on disk
pub mod checkpoint; // Newest G_<epoch>.pth lookup
pub mod documents;  // Text extraction from .txt/.docx uploads
pub mod inference;  // Voice conversion with a trained model
pub mod layout;     // Model directory naming and layout
pub mod pipeline;   // Training pipeline
pub mod svc_config; // Patching the generated toolkit config
pub mod toolkit;    // so-vits-svc-fork command line
pub mod tts;        // Text-to-Speech services
pub mod uploads;    // Spooled uploads and session files
pub mod workers;    // Bounded worker pool
