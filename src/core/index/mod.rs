pub mod hash;
pub mod loader;
pub mod model;

pub use loader::{LoadedPack, PackLoader, INDEX_FILE};
pub use model::{ModMetafile, ModReference, PackIndex, CURSEFORGE_MODE};
