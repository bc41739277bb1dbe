pub mod analysis;
pub mod assessment;
pub mod init;
pub mod plan;
pub mod profile;
pub mod submission;
