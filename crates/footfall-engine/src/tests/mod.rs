//! Engine tests, against in-memory SQLite and an in-process sharded double.

mod support;
