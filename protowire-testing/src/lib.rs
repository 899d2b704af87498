//! Internal testing utilities for the protowire crates.

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

mod bench;

pub use bench::{run_bench, BenchStats};

/// Utility for creating table-driven tests.
///
/// Each case is run under [`catch_unwind`](std::panic::catch_unwind). If any
/// case panics, the remaining cases still run and the final assertion reports
/// every failing case with its debug representation.
///
/// ## Example
///
/// ```
/// use protowire_testing::TestCases;
///
/// // Add #[test] attribute
/// fn test_varint_len() {
///   #[derive(Debug)]
///   struct Case {
///     value: u64,
///     encoded_len: usize,
///   }
///
///   let cases = [
///     Case { value: 0, encoded_len: 1 },
///     Case { value: 150, encoded_len: 2 },
///     Case { value: u64::MAX, encoded_len: 10 },
///   ];
///
///   cases.test_each(|&Case { value, encoded_len }| {
///     let bits = 64 - value.leading_zeros() as usize;
///     assert_eq!(bits.max(1).div_ceil(7), encoded_len);
///   });
/// }
/// # test_varint_len();
/// ```
///
/// ## Passing cases by reference vs. value
///
/// `test_each` passes the case by reference so that it can still format the
/// case after a panic. Use `test_each_clone` or `test_each_value` when the
/// test function needs ownership of the case.
///
/// ## Unwind safety
///
/// Cases, and any values captured by the test closure, must be
/// [unwind safe](https://doc.rust-lang.org/std/panic/fn.catch_unwind.html).
/// Fixtures holding a `&mut Decoder` or other interior state should be built
/// inside the closure from plain data (eg. a `Vec<u8>` buffer) instead.
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Call `test` with a reference to each case, catching any panics.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Variant of [`test_each`](TestCases::test_each) which passes a clone
    /// of each case to the test function.
    fn test_each_clone(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe;

    /// Variant of [`test_each`](TestCases::test_each) which passes cases by
    /// value. Each case is formatted before the test function runs.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| std::panic::catch_unwind(|| test(case)).is_err())
            .collect();
        report_failures(&failures);
    }

    fn test_each_clone(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + Clone + UnwindSafe,
    {
        let failures: Vec<_> = self
            .into_iter()
            .filter(|case| {
                let case = case.clone();
                std::panic::catch_unwind(|| test(case)).is_err()
            })
            .collect();
        report_failures(&failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe,
    {
        let mut failures = Vec::new();
        for case in self {
            let test = &test;
            let case_str = format!("{:?}", case);
            if std::panic::catch_unwind(move || test(case)).is_err() {
                failures.push(case_str);
            }
        }
        report_failures(&failures);
    }
}

fn report_failures<T: Debug>(failures: &[T]) {
    assert_eq!(
        failures.len(),
        0,
        "{} test cases failed: {:?}",
        failures.len(),
        failures
    );
}
