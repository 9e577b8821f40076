pub mod build;
pub mod extract;
pub mod init_manifest;
pub mod status;
