use crate::backup::result_error::error::Error;
use crate::backup::result_error::WithMsg;

pub type Result<T> = std::result::Result<T, Error>;

impl<R, S: Into<String>> WithMsg<S> for Result<R> {
    fn with_msg(self, msg: S) -> Self {
        self.map_err(|e| e.with_msg(msg))
    }
}

pub fn convert_error_vec(errors: Vec<Error>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_error_vec() {
        assert!(convert_error_vec(vec![]).is_ok());

        let res = convert_error_vec(vec![Error::source_missing("/a"), Error::source_missing("/b")]);
        match res {
            Err(Error::LotsOfError(errors)) => assert_eq!(errors.len(), 2),
            _ => panic!("Expected LotsOfError"),
        }
    }

    #[test]
    fn test_result_with_msg() {
        let res: Result<()> = Err(Error::source_missing("/a"));
        let msg = res.with_msg("context").unwrap_err().to_string();
        assert!(msg.starts_with("context:"));
    }
}
