//! Downloader behavior tests, organized by surface


pub(crate) use super::test_helpers::*;
