use std::path::PathBuf;

// The packaging step points PSLAUNCH_PAYLOAD at a payload archive; the bytes
// are then compiled into the binary as an embedded resource. Without it the
// resource table is empty and embedded mode reports the payload as missing.
fn main() {
    println!("cargo:rustc-check-cfg=cfg(embedded_payload)");
    println!("cargo:rerun-if-env-changed=PSLAUNCH_PAYLOAD");

    let Some(payload) = std::env::var_os("PSLAUNCH_PAYLOAD") else {
        return;
    };
    let payload = PathBuf::from(payload);
    let name = payload
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("payload.zip")
        .to_string();
    let payload = payload
        .canonicalize()
        .expect("PSLAUNCH_PAYLOAD must point at an existing archive");

    println!("cargo:rerun-if-changed={}", payload.display());
    println!("cargo:rustc-cfg=embedded_payload");
    println!("cargo:rustc-env=PSLAUNCH_PAYLOAD_NAME={name}");
    println!("cargo:rustc-env=PSLAUNCH_PAYLOAD_FILE={}", payload.display());
}
