mod auth_client_tests;
mod quota_tests;
mod records_client_tests;
mod support;
