pub mod console_display;
pub mod controller;
pub mod json_output;
pub mod keyboard;
pub mod notes;
pub mod sound;
pub mod timer;
pub mod types;

#[cfg(feature = "audio")]
pub mod audio_output;
