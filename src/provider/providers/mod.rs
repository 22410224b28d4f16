//! Concrete provider adapters

pub mod curseforge;
pub mod modrinth;

pub use curseforge::CurseForgeProvider;
pub use modrinth::ModrinthProvider;
