pub mod get;
pub mod init;
pub mod put;
pub mod rm;
pub mod stat;

pub use get::Get;
pub use init::Init;
pub use put::Put;
pub use rm::Rm;
pub use stat::Stat;
