//! keywave - terminal synthesizer
//!
//! Play notes on the home row (A S D F G H J K L, sharps on W E T Y U O),
//! switch waveforms with 1-4, shift octaves with Left/Right.
//!
//! Run with: cargo run

mod app;
mod ui;

use app::Keywave;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    Keywave::new().run()
}
