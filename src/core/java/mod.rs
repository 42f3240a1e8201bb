pub mod runtime;

pub use runtime::{check_java, JavaInfo, RuntimeManifest, JAVA_RUNTIME_INDEX_URL, RUNTIME_DIR};
