//! One module per subcommand, each exposing `execute`.

pub mod audit_cmd;
pub mod completions;
pub mod decrypt;
pub mod encrypt;
pub mod generate_password;
pub mod init;
pub mod list;
pub mod search;
pub mod version;
