//! Cross-module tests for build, persistence and retrieval.

mod retrieval;
