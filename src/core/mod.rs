pub mod calendar;
pub mod display;
pub mod html_parser;
pub mod login_page;
pub mod portal;
pub mod render;
pub mod schedule;
pub mod storage;
