fn main() {
    // Build and git metadata for `logsim --version`. Source tarballs
    // have no git history; fall back to the bare package version.
    if let Err(e) = vergen::EmitBuilder::builder()
        .all_build()
        .all_git()
        .emit()
    {
        println!("cargo:warning=no build metadata emitted: {e}");
    }
}
