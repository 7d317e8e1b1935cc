//! Integration tests driving the HTTP router over the in-memory store.

mod helpers;

mod acknowledgment_test;
mod api_test;
mod compliance_test;
mod escalation_test;
mod notification_test;
