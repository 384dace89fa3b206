pub mod discover;

pub use discover::DiscoverCommand;
