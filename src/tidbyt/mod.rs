//! Rendering the display applet and pushing it to the device.

mod memo;
mod push;
mod render;
mod updater;

pub use memo::PushMemo;
pub use push::{DisplayDevice, TIDBYT_API_URL, TidbytClient};
pub use render::{PixletRenderer, Renderer, render_applet, replace_constants};
pub use updater::{DisplayUpdater, PushOutcome};
