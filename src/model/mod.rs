use thiserror::Error;

pub mod declaration;
pub mod descriptor;
pub mod lock;
pub mod repository;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading configuration toml: {0}")]
    IO(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Missing url component `{0}` in string `{1}`")]
    MissingUrlComponent(String, String),
    #[error("Invalid url component `{0}` in string `{1}`")]
    InvalidUrlComponent(String, String),
    #[error("Invalid revision request `{0}`")]
    InvalidRevisionRequest(String),
    #[error("Invalid source declaration: {0}")]
    InvalidDeclaration(String),
    #[error("Unsupported lock file version {0}")]
    UnsupportedLockFileVersion(toml::Value),
    #[error("Lock file has no version, it was not written by this tool")]
    MissingLockFileVersion,
}
