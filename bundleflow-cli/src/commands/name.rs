//! `name` command.

use bundleflow::catalog::bundle_name_for_asset;

/// Print the bundle name an asset path maps to.
pub fn run(asset_path: &str) {
    println!("{}", bundle_name_for_asset(asset_path));
}
