fn main() {
    println!("cargo:rerun-if-changed=proto/traffic.proto");
    tonic_prost_build::configure()
        .compile_protos(&["proto/traffic.proto"], &["proto/"])
        .expect("Failed to compile proto/traffic.proto");
}
