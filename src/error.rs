use thiserror::Error;

/// Failure classes that decide the process exit code. Everything else is
/// plain `anyhow` context wrapped around one of these at the failure site.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("{0}")]
    Usage(String),
    #[error("elevation unavailable: {0}")]
    ElevationUnavailable(String),
    #[error("runtime acquisition failed: {0}")]
    RuntimeAcquisition(String),
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("download failed: {url}: {reason}")]
    Download { url: String, reason: String },
}

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

impl InstallError {
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallError::Usage(_) => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

/// Exit code for a top-level error, usage-class or not.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<InstallError>()
        .map(InstallError::exit_code)
        .unwrap_or(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_exits_2() {
        let err: anyhow::Error = InstallError::Usage("no app".into()).into();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn runtime_classes_exit_1() {
        for err in [
            InstallError::ElevationUnavailable("none".into()),
            InstallError::RuntimeAcquisition("net".into()),
            InstallError::CatalogUnavailable("404".into()),
            InstallError::Download {
                url: "http://x".into(),
                reason: "500".into(),
            },
        ] {
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn plain_anyhow_exits_1() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&err), 1);
    }
}
