pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

#[macro_export]
macro_rules! verify_data {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_data(result, stringify!($name), stringify!($expr))?;
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[inline]
pub fn verify_data(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        protocol_violation(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}

#[cold]
pub fn protocol_violation(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::Protocol {
        message: format!("{name}: {condition}"),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;

    fn check_len(len: usize) -> super::Result<()> {
        verify_arg!(len, len <= 4);
        Ok(())
    }

    fn check_tag(tag: u8) -> super::Result<()> {
        verify_data!(tag, tag < 2);
        Ok(())
    }

    #[test]
    fn test_verify_macros() {
        assert!(check_len(3).is_ok());
        let err = check_len(5).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidArgument { name, message } => {
                assert_eq!(name, "len");
                assert_eq!(message, "len <= 4");
            }
            _ => panic!("unexpected kind"),
        }
        assert!(check_tag(1).is_ok());
        assert!(check_tag(7).unwrap_err().is_protocol());
    }
}
