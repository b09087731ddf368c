//! End-to-end pipeline scenarios against test doubles.

mod support;
