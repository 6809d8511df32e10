//! Continuous-integration knobs shared by test suites.

pub mod property_test_profile;
