pub mod assets;
pub mod builder;
pub mod extract;
pub mod record;

pub use assets::{AssetIndex, AssetObject};
pub use builder::{artifact_record, AssetFiles, FilesManager, LibraryFiles};
pub use extract::{copy_legacy_assets, extract_natives};
pub use record::{
    dedup_records, normalize_dir, ExtraFileRecord, FileKind, FileOrigin, FileRecord, FileSet,
};
