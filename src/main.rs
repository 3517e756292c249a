//! Stereo scene viewer.
//!
//! Loads a scene description (placed OBJ models, camera and light records),
//! then renders it side by side for a left and a right eye. Navigation mode
//! flies the camera pair; select mode picks and drags objects or the light.

mod app;
mod assets;
mod config;
mod render;
mod scene;

fn main() {
    if let Err(err) = app::run() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
