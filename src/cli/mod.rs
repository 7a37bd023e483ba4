// CLI module

pub mod args;

pub use args::Cli;
