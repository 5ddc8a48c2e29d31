//! Integration tests for logbook
//!
//! Each test drives the compiled binary inside a temporary git repository.

mod helpers;
mod test_add;
mod test_init;
mod test_release;
