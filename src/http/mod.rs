pub mod log_middleware;
