//! Fetches a University of Limerick timetable and turns it into JSON,
//! PNG grids and iCalendar files.

pub mod cli;
pub mod core;
pub mod error;
pub mod http;
pub mod model;
pub mod utils;
