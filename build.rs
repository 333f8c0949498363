use std::{
    process::Command,
    time::{SystemTime, UNIX_EPOCH},
};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=HOSTPKG_BUILD_VERSION");

    // Distribution builds run from tarballs without git metadata.
    if let Ok(version) = std::env::var("HOSTPKG_BUILD_VERSION") {
        println!("cargo:rustc-env=HOSTPKG_VERSION={}", version);
        return;
    }

    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output();

    let version = match output {
        Ok(o) if o.status.success() => {
            let git_output = String::from_utf8(o.stdout)
                .unwrap_or_default()
                .trim()
                .to_string();

            // "v1.2.0" -> "1.2.0"
            let version = git_output.strip_prefix('v').unwrap_or(&git_output);

            if version.ends_with("-dirty") || version.is_empty() {
                format!("{}-{}", version, timestamp())
            } else {
                version.to_string()
            }
        }
        _ => format!("0.0.0-unknown-{}", timestamp()),
    };

    println!("cargo:rustc-env=HOSTPKG_VERSION={}", version);
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
