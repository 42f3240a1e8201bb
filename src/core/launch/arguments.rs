// ─── Argument Assembler ───
// JVM and game arguments from the base manifest, the loader manifest layered
// on top and the launcher configuration, with `${token}` placeholders filled.

use std::path::PathBuf;

use crate::core::account::Account;
use crate::core::config::LauncherConfig;
use crate::core::paths::{arg_path, GamePaths};
use crate::core::platform::{ArchKind, OsKind, Platform};
use crate::core::version::{resolve_arguments, ArgumentValue, Arguments, VersionJson};

const LAUNCHER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything the assembled command line depends on.
pub struct LaunchContext<'a> {
    pub config: &'a LauncherConfig,
    pub account: &'a Account,
    pub paths: &'a GamePaths,
    pub platform: &'a Platform,
    /// Base game manifest.
    pub version: &'a VersionJson,
    /// Manifest the loader layers over the base one.
    pub loader: Option<&'a VersionJson>,
    pub classpath: String,
    /// Client archive the game runs from.
    pub client_jar: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchArguments {
    pub jvm: Vec<String>,
    pub main_class: String,
    pub game: Vec<String>,
}

impl LaunchArguments {
    /// `jvm.. main_class game..`, the argument vector after the executable.
    pub fn into_command_line(self) -> Vec<String> {
        let mut out = self.jvm;
        out.push(self.main_class);
        out.extend(self.game);
        out
    }
}

pub fn build_arguments(ctx: &LaunchContext<'_>) -> LaunchArguments {
    let main_class = ctx
        .loader
        .map(|l| l.main_class.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| ctx.version.main_class.clone());

    LaunchArguments {
        jvm: jvm_arguments(ctx),
        main_class,
        game: game_arguments(ctx),
    }
}

fn jvm_arguments(ctx: &LaunchContext<'_>) -> Vec<String> {
    let mut args = ctx.config.java.args.clone();

    match structured(ctx, |a| &a.jvm) {
        Some(structured) => args.extend(structured),
        None => args.extend(legacy_jvm_defaults(ctx.platform)),
    }

    args.extend(log4j_arguments(ctx.version));
    args.push("-Xmx${max_memory}M".into());
    args.push("-Xms${min_memory}M".into());
    args.push("-Dfml.ignoreInvalidMinecraftCertificates=true".into());

    let vars = [
        ("natives_directory", arg_path(&ctx.paths.natives())),
        ("library_directory", arg_path(&ctx.paths.libraries())),
        ("launcher_name", ctx.config.launcher_name()),
        ("launcher_version", LAUNCHER_VERSION.to_string()),
        ("version_name", ctx.version.id.clone()),
        ("jar_path", arg_path(&ctx.client_jar)),
        ("classpath", ctx.classpath.clone()),
        ("max_memory", ctx.config.memory.max.to_string()),
        ("min_memory", ctx.config.memory.min.to_string()),
        (
            "classpath_separator",
            ctx.platform.os.classpath_separator().to_string(),
        ),
    ];
    args.iter().map(|arg| substitute(arg, &vars)).collect()
}

fn game_arguments(ctx: &LaunchContext<'_>) -> Vec<String> {
    let mut args = ctx.config.minecraft.args.clone();

    match structured(ctx, |a| &a.game) {
        Some(structured) => args.extend(structured),
        None => {
            let legacy = ctx
                .loader
                .and_then(VersionJson::legacy_game_args)
                .or_else(|| ctx.version.legacy_game_args());
            args.extend(legacy.unwrap_or_default());
        }
    }

    if ctx.config.window.fullscreen {
        args.push("--fullscreen".into());
    } else {
        args.extend([
            "--width".into(),
            "${resolution_width}".into(),
            "--height".into(),
            "${resolution_height}".into(),
        ]);
    }

    let account = ctx.account;
    let assets_root = if ctx.version.uses_legacy_assets() {
        arg_path(&ctx.paths.resources())
    } else {
        arg_path(&ctx.paths.assets())
    };
    let vars = [
        ("clientid", account.client_id().to_string()),
        ("auth_xuid", account.xuid().to_string()),
        ("auth_player_name", account.name.clone()),
        ("auth_uuid", account.uuid.clone()),
        ("auth_access_token", account.access_token.clone()),
        ("user_type", account.user_type(&ctx.version.id)),
        ("version_name", ctx.version.id.clone()),
        ("game_directory", arg_path(ctx.paths.root())),
        ("assets_root", assets_root.clone()),
        ("assets_index_name", ctx.version.asset_index_id().to_string()),
        ("version_type", ctx.version.version_type.clone()),
        ("resolution_width", ctx.config.window.width.to_string()),
        ("resolution_height", ctx.config.window.height.to_string()),
        ("auth_session", account.access_token.clone()),
        ("user_properties", account.user_properties_json()),
        ("game_assets", assets_root),
    ];
    args.iter().map(|arg| substitute(arg, &vars)).collect()
}

/// Structured arguments of the base manifest followed by the loader's, or
/// `None` when the base manifest predates structured arguments. Loader
/// lists identical to the base one are not repeated.
fn structured<F>(ctx: &LaunchContext<'_>, pick: F) -> Option<Vec<String>>
where
    F: Fn(&Arguments) -> &Vec<ArgumentValue>,
{
    let base = ctx.version.arguments.as_ref().map(&pick)?;
    let mut out = resolve_arguments(base, ctx.platform);

    if let Some(loader) = ctx.loader.and_then(|l| l.arguments.as_ref()).map(&pick) {
        if loader != base {
            out.extend(resolve_arguments(loader, ctx.platform));
        }
    }
    Some(out)
}

fn legacy_jvm_defaults(platform: &Platform) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-Djava.library.path=${natives_directory}".into(),
        "-Dminecraft.launcher.brand=${launcher_name}".into(),
        "-Dminecraft.launcher.version=${launcher_version}".into(),
        "-Dminecraft.client.jar=${jar_path}".into(),
        "-cp".into(),
        "${classpath}".into(),
    ];

    if platform.os == OsKind::Windows {
        if platform.is_recent_os() {
            args.push("-Dos.name=Windows 10".into());
            args.push("-Dos.version=10.0".into());
        }
        args.push(
            "-XX:HeapDumpPath=MojangTricksIntelDriversForPerformance_javaw.exe_minecraft.exe.heapdump"
                .into(),
        );
    }
    if platform.os == OsKind::MacOs {
        args.push("-XstartOnFirstThread".into());
    }
    if platform.arch == ArchKind::X86 {
        args.push("-Xss1M".into());
    }
    args
}

/// Log4Shell mitigation for the affected version bands.
fn log4j_arguments(version: &VersionJson) -> Option<String> {
    if version.id == "1.18" {
        return Some("-Dlog4j2.formatMsgNoLookups=true".into());
    }
    match version.minor_version()? {
        17 => Some("-Dlog4j2.formatMsgNoLookups=true".into()),
        12..=16 => Some("-Dlog4j.configurationFile=log4j2_112-116.xml".into()),
        7..=11 => Some("-Dlog4j.configurationFile=log4j2_17-111.xml".into()),
        _ => None,
    }
}

fn substitute(arg: &str, vars: &[(&str, String)]) -> String {
    if !arg.contains("${") {
        return arg.to_string();
    }
    let mut out = arg.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("${{{}}}", key), value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::platform::{HostEnvironment, StaticHost};

    fn platform(os: OsKind, arch: ArchKind) -> Platform {
        StaticHost::new(os, arch).platform().unwrap()
    }

    fn legacy_version() -> VersionJson {
        VersionJson::parse(
            &serde_json::json!({
                "id": "1.8.9",
                "type": "release",
                "mainClass": "net.minecraft.client.main.Main",
                "assets": "1.8",
                "minecraftArguments": "--username ${auth_player_name} --version ${version_name} --gameDir ${game_directory} --assetsDir ${assets_root} --assetIndex ${assets_index_name} --uuid ${auth_uuid} --accessToken ${auth_access_token} --userProperties ${user_properties} --userType ${user_type}"
            })
            .to_string(),
        )
        .unwrap()
    }

    fn modern_version() -> VersionJson {
        VersionJson::parse(
            &serde_json::json!({
                "id": "1.20.1",
                "type": "release",
                "mainClass": "net.minecraft.client.main.Main",
                "assetIndex": {"id": "5", "url": "https://example.com/5.json", "sha1": "x", "size": 1, "totalSize": 1},
                "arguments": {
                    "game": [
                        "--username", "${auth_player_name}",
                        {"rules": [{"action": "allow", "features": {"is_demo_user": true}}], "value": "--demo"}
                    ],
                    "jvm": [
                        {"rules": [{"action": "allow", "os": {"name": "osx"}}], "value": ["-XstartOnFirstThread"]},
                        "-Djava.library.path=${natives_directory}",
                        "-cp", "${classpath}"
                    ]
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    fn config() -> LauncherConfig {
        let mut config = LauncherConfig::new("srv");
        config.java.args = vec!["-XX:+UseG1GC".into()];
        config
    }

    fn ctx<'a>(
        config: &'a LauncherConfig,
        account: &'a Account,
        paths: &'a GamePaths,
        platform: &'a Platform,
        version: &'a VersionJson,
        loader: Option<&'a VersionJson>,
    ) -> LaunchContext<'a> {
        LaunchContext {
            config,
            account,
            paths,
            platform,
            version,
            loader,
            classpath: "/r/a.jar:/r/b.jar".into(),
            client_jar: paths.version_jar(&version.id),
        }
    }

    #[test]
    fn legacy_manifest_uses_default_jvm_list() {
        let config = config();
        let account = Account::offline("Steve");
        let paths = GamePaths::new("/r");
        let linux = platform(OsKind::Linux, ArchKind::X64);
        let version = legacy_version();

        let args = build_arguments(&ctx(&config, &account, &paths, &linux, &version, None));
        let launcher_version = format!("-Dminecraft.launcher.version={}", LAUNCHER_VERSION);
        assert_eq!(
            args.jvm,
            vec![
                "-XX:+UseG1GC",
                "-Djava.library.path=/r/bin/natives",
                "-Dminecraft.launcher.brand=srv-launcher",
                launcher_version.as_str(),
                "-Dminecraft.client.jar=/r/versions/1.8.9/1.8.9.jar",
                "-cp",
                "/r/a.jar:/r/b.jar",
                "-Dlog4j.configurationFile=log4j2_17-111.xml",
                "-Xmx2048M",
                "-Xms1024M",
                "-Dfml.ignoreInvalidMinecraftCertificates=true",
            ]
        );
        assert_eq!(args.main_class, "net.minecraft.client.main.Main");
        assert_eq!(&args.game[..4], &["--username", "Steve", "--version", "1.8.9"]);
        assert!(args.game.contains(&"--userProperties".to_string()));
        assert!(args.game.contains(&"{}".to_string()));
        assert_eq!(
            &args.game[args.game.len() - 4..],
            &["--width", "854", "--height", "480"]
        );
    }

    #[test]
    fn legacy_platform_extras() {
        let windows = StaticHost::new(OsKind::Windows, ArchKind::X86)
            .with_os_version("10.0.19045")
            .platform()
            .unwrap();
        let args = legacy_jvm_defaults(&windows);
        assert!(args.contains(&"-Dos.name=Windows 10".to_string()));
        assert!(args.iter().any(|a| a.starts_with("-XX:HeapDumpPath=")));
        assert!(args.contains(&"-Xss1M".to_string()));

        let mac = legacy_jvm_defaults(&platform(OsKind::MacOs, ArchKind::Arm64));
        assert!(mac.contains(&"-XstartOnFirstThread".to_string()));
        assert!(!mac.contains(&"-Xss1M".to_string()));
    }

    #[test]
    fn structured_arguments_are_rule_filtered_and_layered() {
        let mut config = config();
        config.window.fullscreen = true;
        let account = Account::offline("Alex");
        let paths = GamePaths::new("/r");
        let linux = platform(OsKind::Linux, ArchKind::X64);
        let version = modern_version();
        let loader = VersionJson::parse(
            &serde_json::json!({
                "id": "forge-47.2.0",
                "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
                "arguments": {
                    "game": ["--launchTarget", "forgeclient"],
                    "jvm": ["-DlibraryDirectory=${library_directory}"]
                }
            })
            .to_string(),
        )
        .unwrap();

        let args = build_arguments(&ctx(
            &config,
            &account,
            &paths,
            &linux,
            &version,
            Some(&loader),
        ));
        assert_eq!(
            args.jvm,
            vec![
                "-XX:+UseG1GC",
                "-Djava.library.path=/r/bin/natives",
                "-cp",
                "/r/a.jar:/r/b.jar",
                "-DlibraryDirectory=/r/libraries",
                "-Xmx2048M",
                "-Xms1024M",
                "-Dfml.ignoreInvalidMinecraftCertificates=true",
            ]
        );
        assert_eq!(args.main_class, "cpw.mods.bootstraplauncher.BootstrapLauncher");
        assert_eq!(
            args.game,
            vec!["--username", "Alex", "--launchTarget", "forgeclient", "--fullscreen"]
        );
    }

    #[test]
    fn identical_loader_arguments_are_not_repeated() {
        let config = config();
        let account = Account::offline("Alex");
        let paths = GamePaths::new("/r");
        let linux = platform(OsKind::Linux, ArchKind::X64);
        let version = modern_version();
        let derived = version.derive_overlay("optifine");

        let args = build_arguments(&ctx(
            &config,
            &account,
            &paths,
            &linux,
            &version,
            Some(&derived),
        ));
        assert_eq!(
            args.game.iter().filter(|a| *a == "--username").count(),
            1
        );
    }

    #[test]
    fn legacy_assets_point_at_resources() {
        let config = config();
        let account = Account::offline("Alex");
        let paths = GamePaths::new("/r");
        let linux = platform(OsKind::Linux, ArchKind::X64);
        let mut version = legacy_version();
        version.id = "1.5.2".into();
        version.assets = Some("legacy".into());

        let args = build_arguments(&ctx(&config, &account, &paths, &linux, &version, None));
        let idx = args.game.iter().position(|a| a == "--assetsDir").unwrap();
        assert_eq!(args.game[idx + 1], "/r/resources");
        assert!(!args.jvm.iter().any(|a| a.contains("log4j")));
    }

    #[test]
    fn log4j_bands() {
        let with_id = |id: &str| {
            let mut v = legacy_version();
            v.id = id.into();
            log4j_arguments(&v)
        };
        assert_eq!(with_id("1.18").unwrap(), "-Dlog4j2.formatMsgNoLookups=true");
        assert_eq!(with_id("1.17.1").unwrap(), "-Dlog4j2.formatMsgNoLookups=true");
        assert!(with_id("1.16.5").unwrap().ends_with("log4j2_112-116.xml"));
        assert!(with_id("1.7.10").unwrap().ends_with("log4j2_17-111.xml"));
        assert!(with_id("1.18.2").is_none());
        assert!(with_id("1.6.4").is_none());
    }

    #[test]
    fn command_line_order() {
        let args = LaunchArguments {
            jvm: vec!["-Xmx1M".into()],
            main_class: "Main".into(),
            game: vec!["--demo".into()],
        };
        assert_eq!(args.into_command_line(), vec!["-Xmx1M", "Main", "--demo"]);
    }
}
