//! Concrete probability exercises.
//!
//! Every scenario is a pure function of an [`Estimator`](crate::estimator::Estimator)
//! (where it samples) and a parameter struct whose `Default` holds the
//! classic textbook constants. Results are plain serializable data;
//! formatting lives in [`crate::report`].
//!
//! | Module | Scenarios |
//! |---|---|
//! | [`combinatorics`] | party support, equal split, lottery, four of a kind |
//! | [`dice`] | coin tosses, unfair die, rolls to a target sum |
//! | [`curves`] | discrete uniform PMF, uniform and Gaussian PDF/CDF tables |
//! | [`clt`] | book stacks, battery cartons |
//! | [`intervals`] | sample-size sweep, interval coverage |

pub mod clt;
pub mod combinatorics;
pub mod curves;
pub mod dice;
pub mod intervals;
