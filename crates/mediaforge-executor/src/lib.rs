//! Runtime-aware spawning for work that shouldn't run on the cooperative
//! scheduler.
//!
//! The worker pipeline (spec §4.H) shells out to the media tool and then
//! blocks on the child process; [`BlockingExecutor::spawn_blocking`] moves
//! that wait onto tokio's blocking thread pool so it doesn't stall other
//! jobs sharing the runtime.
//!
//! # Examples
//!
//! ```
//! use mediaforge_executor::BlockingExecutor;
//!
//! # async fn example() {
//! let executor = BlockingExecutor::current();
//! let status = executor.spawn_blocking(|| 0).await.unwrap();
//! assert_eq!(status, 0);
//! # }
//! ```

mod executor;

pub use executor::{BlockingExecutor, CurrentRuntime, Executor};
