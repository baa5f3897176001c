pub mod exchange;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
