mod flake;
mod hex;

pub use flake::*;
