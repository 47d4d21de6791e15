pub mod rng;
pub mod render;
pub mod render2d;

pub use rng::{RngStream, SeedSequence, entropy_seed};
pub use render::{encode_png, save_png};
pub use render2d::{Canvas, Color, BLACK, WHITE, RED, GREEN, BLUE, DARK_GRAY, ICE_BLUE, SAND};
