mod artifact;
mod mirrors;

pub use artifact::MavenArtifact;
pub use mirrors::{MirrorResolver, ResolvedArtifact};

/// Well-known Maven repositories used by the Minecraft ecosystem.
pub const MOJANG_LIBRARIES: &str = "https://libraries.minecraft.net/";
pub const FORGE_MAVEN: &str = "https://maven.minecraftforge.net/";
pub const CREEPERHOST_MAVEN: &str = "https://maven.creeperhost.net/";

/// Mirrors probed, in order, for libraries that only carry a coordinate.
pub fn default_mirrors() -> Vec<String> {
    vec![
        MOJANG_LIBRARIES.to_string(),
        FORGE_MAVEN.to_string(),
        CREEPERHOST_MAVEN.to_string(),
    ]
}
