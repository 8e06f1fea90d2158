/// Converts a `Result` into an `Option`, logging the error at the given level.
///
/// Used wherever a failure is tolerated (best-effort enumeration, auxiliary stat files)
/// but should still leave a trace.
pub trait ResultOkLogExt<T, E> {
    fn ok_log(self, level: log::Level) -> Option<T>;
}

impl<T, E> ResultOkLogExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error,
{
    fn ok_log(self, level: log::Level) -> Option<T> {
        match self {
            Ok(ok) => Some(ok),
            Err(err) => {
                log::log!(level, "{err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_log() {
        let ok: Result<u32, std::io::Error> = Ok(7);
        assert_eq!(ok.ok_log(log::Level::Warn), Some(7));

        let err: Result<u32, std::io::Error> = Err(std::io::ErrorKind::NotFound.into());
        assert_eq!(err.ok_log(log::Level::Debug), None);
    }
}
