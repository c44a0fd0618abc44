// Unit tests for the public API
// This file acts as the entry point for all unit tests in tests/unit/

mod unit {
    mod config_tests;
    mod export_tests;
    mod store_tests;
    mod watermark_tests;
}
