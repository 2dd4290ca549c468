//! Centralized bundle naming conventions.
//!
//! This module is the single source of truth for how the producer names
//! bundles and how runtime asset paths are normalized:
//! - Bundle names derived from source asset paths (e.g. `assets$abundles$hero¥prefab.bundle`)
//! - Full asset paths used as asset index keys (e.g. `Assets/AssetBundles/Hero.prefab`)
//!
//! The name mapping is one-way. Lookups from asset path to bundle always go
//! through the asset index, never through this function.

/// Default root under which all bundled assets live.
pub const DEFAULT_ASSET_ROOT: &str = "Assets/AssetBundles/";

/// Separator used in asset paths.
const PATH_SEPARATOR: char = '/';

/// Sentinel substituted for the path separator.
const PATH_SENTINEL: char = '$';

/// Extension delimiter used in asset paths.
const EXTENSION_DELIMITER: char = '.';

/// Sentinel substituted for extension delimiters.
const EXTENSION_SENTINEL: char = '¥';

/// Variant suffix appended to every bundle name.
pub const BUNDLE_VARIANT_SUFFIX: &str = ".bundle";

/// Derive the bundle name for a source asset path.
///
/// # Format
///
/// `lowercase(path with '/' → '$' and '.' → '¥')` + `.bundle`
///
/// # Examples
///
/// ```
/// use bundleflow::catalog::bundle_name_for_asset;
///
/// assert_eq!(
///     bundle_name_for_asset("Assets/AssetBundles/Hero.prefab"),
///     "assets$assetbundles$hero¥prefab.bundle"
/// );
/// ```
pub fn bundle_name_for_asset(asset_path: &str) -> String {
    let mut name: String = asset_path
        .chars()
        .map(|c| match c {
            PATH_SEPARATOR => PATH_SENTINEL,
            EXTENSION_DELIMITER => EXTENSION_SENTINEL,
            other => other,
        })
        .collect::<String>()
        .to_lowercase();
    name.push_str(BUNDLE_VARIANT_SUFFIX);
    name
}

/// Join a caller-supplied asset path onto the asset root.
///
/// Paths that already start with the root are returned unchanged, and
/// backslashes are normalized to forward slashes.
///
/// # Examples
///
/// ```
/// use bundleflow::catalog::normalize_asset_path;
///
/// assert_eq!(
///     normalize_asset_path("Assets/AssetBundles/", "Prefabs/Hero.prefab"),
///     "Assets/AssetBundles/Prefabs/Hero.prefab"
/// );
/// assert_eq!(
///     normalize_asset_path("Assets/AssetBundles", "Assets/AssetBundles/Hero.prefab"),
///     "Assets/AssetBundles/Hero.prefab"
/// );
/// ```
pub fn normalize_asset_path(asset_root: &str, path: &str) -> String {
    let path = path.replace('\\', "/");
    let root = asset_root.replace('\\', "/");
    let root = root.trim_end_matches(PATH_SEPARATOR);

    if root.is_empty() {
        return path;
    }

    if let Some(rest) = path.strip_prefix(root) {
        if rest.is_empty() || rest.starts_with(PATH_SEPARATOR) {
            return path;
        }
    }

    format!(
        "{}{}{}",
        root,
        PATH_SEPARATOR,
        path.trim_start_matches(PATH_SEPARATOR)
    )
}
