//!
//! Role permission matching for the Morpheus provider
//!
//! Provides the subset matcher used to decide whether a declared permission
//! document is still satisfied by the permissions a server reports, plus the
//! value model, decoding and reconciliation around it.
#![deny(missing_docs)]

pub use subset::{contains_subset, is_subset, SubsetError};
pub use value::{Field, Record, Scalar, Value};

pub mod config;
pub mod logging;
pub mod permissions;
pub mod reconcile;
pub mod subset;
pub mod value;

#[macro_export]
/// Time the code inside the macro. Write the elapsed time to debug logs.
/// Derived from https://notes.iveselov.info/programming/time_it-a-case-study-in-rust-macros
macro_rules! log_runtime {
    ($context:literal, $($tt:tt)+) => {
        {
            $crate::logging::debug!("{}: starting", $context);
            let timer = std::time::Instant::now();
            let x =
            $(
                $tt
            )+;
            $crate::logging::debug!("{}: {:?}", $context, timer.elapsed());
            x
        }
    }
}
