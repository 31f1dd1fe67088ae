//! Default configuration values

use crate::core::package::{PackageRole, PackageSpec, ServiceFamily};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "protopack.toml";

/// Default directory containing the proto files
pub const DEFAULT_PROTO_DIR: &str = "proto";

/// Default output root
pub const DEFAULT_OUTPUT_DIR: &str = "generated_packages";

/// Subdirectory of the output root holding one directory per package
pub const PACKAGES_SUBDIR: &str = "packages";

/// Subdirectory of each package holding its (empty) test scaffold
pub const TESTS_SUBDIR: &str = "tests";

/// Default compiler command line
pub const DEFAULT_COMPILER: &[&str] = &["python3", "-m", "grpc_tools.protoc"];

/// Suffixes of files produced by the code compiler
pub const GENERATED_SUFFIXES: &[&str] = &["_pb2.py", "_pb2_grpc.py"];

/// Default version written to generated manifests
pub const DEFAULT_PACKAGE_VERSION: &str = "0.1.0";

/// Serialization runtime, required by every package
pub const PROTOBUF_REQUIREMENT: &str = "protobuf>=4.0.0";

/// RPC runtime, required by client and server packages
pub const GRPCIO_REQUIREMENT: &str = "grpcio>=1.50.0";

/// RPC code generator, required by client and server packages
pub const GRPCIO_TOOLS_REQUIREMENT: &str = "grpcio-tools>=1.50.0";

/// Minimum Python version declared in generated manifests
pub const REQUIRES_PYTHON: &str = ">=3.8";

/// The built-in package table: one messages package and four service
/// packages depending on it
pub fn default_packages() -> Vec<PackageSpec> {
    vec![
        PackageSpec::new("AudioMessages", PackageRole::Messages, &["audio-message.proto"])
            .with_description(
                "Standalone package containing AudioMessage and Metadata protobuf messages",
            ),
        PackageSpec::new(
            "TranscribeClient",
            PackageRole::Client,
            &["transcribe-interface.proto"],
        )
        .with_service("TranscribeWorker", ServiceFamily::Transcription)
        .with_description("Python client for TranscribeModelWorker service")
        .depends_on("AudioMessages"),
        PackageSpec::new(
            "TranscribeServer",
            PackageRole::Server,
            &["transcribe-interface.proto"],
        )
        .with_service("TranscribeWorker", ServiceFamily::Transcription)
        .with_description("Python server skeleton for TranscribeModelWorker service")
        .depends_on("AudioMessages"),
        PackageSpec::new("AudioCloneClient", PackageRole::Client, &["clone-interface.proto"])
            .with_service("AudioCloneModelWorker", ServiceFamily::Cloning)
            .with_description("Python client for AudioCloneModelWorker service")
            .depends_on("AudioMessages"),
        PackageSpec::new("AudioCloneServer", PackageRole::Server, &["clone-interface.proto"])
            .with_service("AudioCloneModelWorker", ServiceFamily::Cloning)
            .with_description("Python server skeleton for AudioCloneModelWorker service")
            .depends_on("AudioMessages"),
    ]
}
