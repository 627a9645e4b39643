//! Cross-crate tests for the user-store subsystem live under `tests/`.
