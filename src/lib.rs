pub mod activate;
pub mod commands;
pub mod error;
pub mod fs_utils;
pub mod paths;
pub mod profile;
pub mod prompt;
pub mod store;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
