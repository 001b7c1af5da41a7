pub mod cli;
pub mod keymap;
