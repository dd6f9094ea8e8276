pub mod offboarding;
