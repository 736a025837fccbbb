//! Assertion helper available to spec code.
//!
//! ```ignore
//! scope.it("adds", || async { expect(1 + 1).to_equal(2) });
//! ```

use std::fmt::Debug;

use barista_core::{TestError, TestResult};

/// Start an expectation about `actual`.
pub fn expect<T>(actual: T) -> Expectation<T> {
    Expectation { actual }
}

/// A value under test
#[derive(Debug)]
pub struct Expectation<T> {
    actual: T,
}

impl<T: Debug> Expectation<T> {
    pub fn to_equal<U>(&self, expected: U) -> TestResult
    where
        T: PartialEq<U>,
        U: Debug,
    {
        if self.actual == expected {
            Ok(())
        } else {
            Err(TestError::assertion(format!(
                "expected {:?} to equal {:?}",
                self.actual, expected
            )))
        }
    }

    pub fn not_to_equal<U>(&self, expected: U) -> TestResult
    where
        T: PartialEq<U>,
        U: Debug,
    {
        if self.actual != expected {
            Ok(())
        } else {
            Err(TestError::assertion(format!(
                "expected {:?} not to equal {:?}",
                self.actual, expected
            )))
        }
    }

    pub fn to_be_greater_than<U>(&self, bound: U) -> TestResult
    where
        T: PartialOrd<U>,
        U: Debug,
    {
        if self.actual > bound {
            Ok(())
        } else {
            Err(TestError::assertion(format!(
                "expected {:?} to be greater than {:?}",
                self.actual, bound
            )))
        }
    }
}

impl Expectation<bool> {
    pub fn to_be_true(&self) -> TestResult {
        self.to_equal(true)
    }

    pub fn to_be_false(&self) -> TestResult {
        self.to_equal(false)
    }
}

impl<T: AsRef<str>> Expectation<T> {
    pub fn to_contain(&self, needle: &str) -> TestResult {
        let haystack = self.actual.as_ref();
        if haystack.contains(needle) {
            Ok(())
        } else {
            Err(TestError::assertion(format!(
                "expected {:?} to contain {:?}",
                haystack, needle
            )))
        }
    }
}
