pub mod app;
pub mod browse_view;
pub mod login_view;
pub mod notice;
pub mod projection_view;
pub mod styles;

#[cfg(test)]
pub mod test_helpers;
