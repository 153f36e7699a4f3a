pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// Returns an `InvalidArgument` error from the enclosing function unless the
/// condition holds. `$name` names the offending argument.
#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $cond:expr) => {
        $crate::result::check($cond, stringify!($name), stringify!($cond), false)?
    };
}

/// Like [`verify_arg!`], for conditions on decoded data; fails with
/// `InvalidFormat`.
#[macro_export]
macro_rules! verify_data {
    ($name:expr, $cond:expr) => {
        $crate::result::check($cond, stringify!($name), stringify!($cond), true)?
    };
}

#[doc(hidden)]
#[inline]
pub fn check(holds: bool, name: &str, condition: &str, is_data: bool) -> Result<()> {
    if holds {
        Ok(())
    } else {
        Err(violation(name, condition, is_data))
    }
}

#[cold]
fn violation(name: &str, condition: &str, is_data: bool) -> crate::error::Error {
    let message = format!("expected `{condition}`");
    if is_data {
        crate::error::Error::invalid_format(name, message)
    } else {
        crate::error::Error::invalid_arg(name, message)
    }
}
