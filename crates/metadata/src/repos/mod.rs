//! Repository traits for metadata operations.

pub mod assets;
pub mod metadata;
pub mod permissions;
pub mod tokens;

pub use assets::AssetRepo;
pub use metadata::MetadataRepo;
pub use permissions::PermissionGate;
pub use tokens::TokenRepo;
