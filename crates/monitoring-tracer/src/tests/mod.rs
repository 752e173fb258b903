mod helpers;

mod log_extraction;
