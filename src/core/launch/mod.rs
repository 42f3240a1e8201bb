pub mod arguments;
pub mod classpath;
pub mod task;

pub use arguments::{build_arguments, LaunchArguments, LaunchContext};
pub use classpath::{build_classpath, classpath_records};
pub use task::run_game;
