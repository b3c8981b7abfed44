use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");

    let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_default();

    // A release build sits exactly on the `v<version>` tag.
    let release_tag = format!("v{}", std::env::var("CARGO_PKG_VERSION").unwrap_or_default());
    let on_tag = git(&["describe", "--exact-match", "--tags", "HEAD"])
        .is_some_and(|tag| tag == release_tag);

    println!("cargo:rustc-env=GIT_HASH={hash}");
    println!("cargo:rustc-env=ON_RELEASE_TAG={on_tag}");
}
